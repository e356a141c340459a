//! Window engine - console state machine driven by window records
//!
//! States are window names. The engine starts at [`HOME`], renders the
//! window's prompt and menu, applies the answer and moves to the next window
//! until [`EXIT`] is reached. Persisting the store is the caller's job once
//! [`WindowEngine::run`] returns.

mod console;
mod prompt;
mod window;

pub use console::{exit_marker, Console, Selection, EXIT_LABEL};
pub use prompt::{underline, PromptTemplate};
pub use window::{
    ChoiceSource, Choices, FixedChoice, InputPrompt, Prompt, RawChoice, RawWindow, Window,
    WindowSet, EXIT, HOME,
};

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::dispatch::{Dispatcher, Operation};
use crate::error::ConfigError;
use crate::session::{Session, SessionField};
use crate::store::{EntityField, IndexList, ResourcePath, ResourceStore};

/// Drives one interactive session over a window table
pub struct WindowEngine {
    dispatcher: Dispatcher,
    session: Session,
}

impl WindowEngine {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run from `home` until the user exits or input runs out
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        windows: &WindowSet,
        store: &mut ResourceStore,
        console: &mut Console<R, W>,
    ) -> Result<()> {
        log::info!("Session started at {}", self.session.started_at);
        let mut current = HOME.to_string();
        while current != EXIT {
            let window = windows.get(&current)?;
            let next = self.step(&current, window, store, console)?;
            log::debug!("Window {} -> {}", current, next);
            current = next;
        }
        console.out().flush()?;
        log::info!("Session finished");
        Ok(())
    }

    /// Show one window and return the name of the next one
    fn step<R: BufRead, W: Write>(
        &mut self,
        name: &str,
        window: &Window,
        store: &mut ResourceStore,
        console: &mut Console<R, W>,
    ) -> Result<String> {
        let title = self.render_prompt(&window.prompt, store);
        writeln!(console.out())?;
        writeln!(console.out(), "{}", title)?;
        writeln!(console.out(), "{}", underline(&title))?;

        match &window.choices {
            Choices::Fixed {
                options,
                next_window,
            } => {
                let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
                let Selection::Option(index) = self.ask(&labels, console)? else {
                    return Ok(EXIT.to_string());
                };
                let choice = &options[index];
                if let Some(op) = choice.operation {
                    self.invoke(op, store, console)?;
                }
                if !choice.chain.is_empty() {
                    self.session.set_chain(choice.chain.iter().cloned());
                }
                self.follow(name, next_window.as_deref())
            }
            Choices::Dynamic {
                source,
                filter,
                labels,
                write_to,
                next_window,
            } => {
                let values = self.collect(*source, *filter, store);
                let shown: Vec<String> = values
                    .iter()
                    .map(|value| relabel(value, *labels, store))
                    .collect();
                let Selection::Option(index) = self.ask(&shown, console)? else {
                    return Ok(EXIT.to_string());
                };
                self.write(*write_to, &values[index])?;
                self.follow(name, next_window.as_deref())
            }
            Choices::Paths {
                indexes,
                write_to,
                operation,
                next_window,
            } => {
                let paths = union_paths(indexes, store);
                let shown: Vec<String> = paths.iter().map(|p| trail(p, store)).collect();
                let Selection::Option(index) = self.ask(&shown, console)? else {
                    return Ok(EXIT.to_string());
                };
                self.write(*write_to, &paths[index].to_string())?;
                if let Some(op) = operation {
                    self.invoke(*op, store, console)?;
                }
                Ok(next_window.clone())
            }
            Choices::InputChain {
                prompts,
                operation,
                next_window,
            } => {
                for step in prompts {
                    writeln!(console.out(), "{}", step.prompt)?;
                    let Some(line) = console.read_line()? else {
                        log::info!("Input closed inside {}, exiting", name);
                        return Ok(EXIT.to_string());
                    };
                    self.write(step.write_to, &line)?;
                }
                if let Some(op) = operation {
                    self.invoke(*op, store, console)?;
                }
                Ok(next_window.clone())
            }
        }
    }

    fn render_prompt(&self, prompt: &Prompt, store: &ResourceStore) -> String {
        match prompt {
            Prompt::Static(text) => text.clone(),
            Prompt::Dynamic {
                template,
                replacements,
            } => {
                let values: HashMap<String, String> = replacements
                    .iter()
                    .map(|(key, token)| {
                        (key.clone(), token.lookup(&self.session, store).unwrap_or_default())
                    })
                    .collect();
                template.render(&values)
            }
        }
    }

    fn ask<S: AsRef<str>, R: BufRead, W: Write>(
        &self,
        labels: &[S],
        console: &mut Console<R, W>,
    ) -> Result<Selection> {
        let exit = exit_marker(labels.len());
        console.print_menu(labels, exit)?;
        console.choose(labels.len())
    }

    fn invoke<R: BufRead, W: Write>(
        &mut self,
        op: Operation,
        store: &mut ResourceStore,
        console: &mut Console<R, W>,
    ) -> Result<()> {
        self.dispatcher
            .invoke(op, store, &mut self.session, console.out())
    }

    fn write(&mut self, field: SessionField, value: &str) -> Result<()> {
        self.session
            .set_text(field, value)
            .with_context(|| format!("Cannot store {:?} in {}", value, field))
    }

    /// Next window from the pending chain, else the declared one
    fn follow(&mut self, name: &str, declared: Option<&str>) -> Result<String> {
        if let Some(next) = self.session.next_window() {
            return Ok(next);
        }
        match declared {
            Some(next) => Ok(next.to_string()),
            None => Err(ConfigError::EmptyWindowChain(name.to_string()).into()),
        }
    }

    /// Options of a dynamic window, after the session filter
    fn collect(
        &self,
        source: ChoiceSource,
        filter: Option<SessionField>,
        store: &ResourceStore,
    ) -> Vec<String> {
        let values = match source {
            ChoiceSource::Session(field) => self.session.values(field),
            ChoiceSource::Index(list) => store.index(list),
        };
        match filter {
            Some(field) => {
                let needle = self.session.get_text(field);
                values.into_iter().filter(|v| v.contains(&needle)).collect()
            }
            None => values,
        }
    }
}

/// Display label for a dynamic option; the raw value when it names no resource
fn relabel(value: &str, field: Option<EntityField>, store: &ResourceStore) -> String {
    let Some(field) = field else {
        return value.to_string();
    };
    value
        .parse::<ResourcePath>()
        .ok()
        .and_then(|path| store.get_field(&path, field).ok())
        .unwrap_or_else(|| value.to_string())
}

/// Union of several index lists, one entry per trailing id, sorted
fn union_paths(indexes: &[IndexList], store: &ResourceStore) -> Vec<ResourcePath> {
    let mut paths: Vec<ResourcePath> = indexes
        .iter()
        .filter_map(|list| store.index_paths(*list))
        .flatten()
        .cloned()
        .collect();
    paths.sort_by_key(|p| p.to_string());
    let mut seen = std::collections::HashSet::new();
    paths.retain(|p| seen.insert(p.id().to_string()));
    paths
}

/// Readable trail such as `Website.Launch.Buy domain`
fn trail(path: &ResourcePath, store: &ResourceStore) -> String {
    path.lineage()
        .iter()
        .map(|p| store.text(p).unwrap_or(p.id()).to_string())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, BoardExporter};
    use crate::store::Status;
    use serde_json::json;
    use std::io::Cursor;

    struct NullExporter;

    impl BoardExporter for NullExporter {
        fn export(&mut self, _boards: &[Board]) -> Result<()> {
            Ok(())
        }
    }

    fn windows() -> WindowSet {
        serde_json::from_value(json!({
            "home": {
                "prompt": "Main Menu",
                "choice_type": "static_numeric",
                "choices": [
                    ["Add project", "", "new_project"],
                    ["Pick project", "", "pick_project,project_menu"],
                    ["Edit", "", "pick_resource"]
                ]
            },
            "new_project": {
                "prompt": "New project",
                "choice_type": "input_chain",
                "choices": [["Name?", "input_text"]],
                "function": "add_project",
                "next_window": "home"
            },
            "pick_project": {
                "prompt": "Projects",
                "choice_type": "dynamic_numeric",
                "source": "project_paths",
                "labels": "text",
                "write_to": "active_project"
            },
            "project_menu": {
                "prompt": "Project {name}",
                "prompt_type": "dynamic",
                "replacements": {"name": "@active_project.text"},
                "choice_type": "static_numeric",
                "choices": [["Back", "", ""]],
                "next_window": "home"
            },
            "pick_resource": {
                "prompt": "Resources",
                "choice_type": "dynamic_paths",
                "filters": ["project_paths", "storys", "tasks"],
                "write_to": "active_resource",
                "function": "set_active_attributes",
                "next_window": "pick_attribute"
            },
            "pick_attribute": {
                "prompt": "Attribute",
                "choice_type": "dynamic_numeric",
                "source": "runtime.active_attributes",
                "write_to": "selected_attribute",
                "next_window": "new_value"
            },
            "new_value": {
                "prompt": "New value",
                "choice_type": "input_chain",
                "choices": [["Value?", "input_text"]],
                "function": "update_attribute",
                "next_window": "home"
            }
        }))
        .unwrap()
    }

    fn run(input: &str, store: &mut ResourceStore) -> (WindowEngine, String) {
        let mut engine = WindowEngine::new(Dispatcher::new(Box::new(NullExporter)));
        let mut console = Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        engine.run(&windows(), store, &mut console).unwrap();
        let (_, out) = console.into_inner();
        (engine, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_exit_from_home() {
        let mut store = ResourceStore::new();
        let (_, out) = run("9\n", &mut store);
        assert_eq!(
            out,
            "\nMain Menu\n---------\n0: Add project\n1: Pick project\n2: Edit\n9: Save and Exit\n"
        );
    }

    #[test]
    fn test_input_chain_adds_project() {
        let mut store = ResourceStore::new();
        let (engine, _) = run("0\nWebsite\n9\n", &mut store);
        assert_eq!(store.project_paths().len(), 1);
        assert_eq!(engine.session().input_text, "Website");
    }

    #[test]
    fn test_dynamic_selection_and_prompt() {
        let mut store = ResourceStore::new();
        let project = store.insert_project("Website");
        let (engine, out) = run("1\n0\n0\n9\n", &mut store);

        assert!(out.contains("0: Website\n"));
        assert!(out.contains("\nProject Website\n---------------\n"));
        assert_eq!(engine.session().active_project, Some(project));
    }

    #[test]
    fn test_edit_task_status_through_paths() {
        let mut store = ResourceStore::new();
        store.insert_project("Website");
        let backlog = store.story_paths()[0].clone();
        let task = store.insert_task(&backlog, "Buy domain", Status::ToDo).unwrap();

        // options are sorted path strings, so locate the task's menu line
        let mut scratch = store.clone();
        let (_, listing) = run("2\n", &mut scratch);
        let line = listing
            .lines()
            .find(|l| l.ends_with(": Website.Backlog.Buy domain"))
            .unwrap();
        let index = line.split(':').next().unwrap();

        let input = format!("2\n{}\n1\nin progress\n9\n", index);
        run(&input, &mut store);
        assert_eq!(store.task(&task).unwrap().status, Status::InProgress);
    }

    #[test]
    fn test_empty_chain_is_fatal() {
        let set: WindowSet = serde_json::from_value(json!({
            "home": {
                "prompt": "Main Menu",
                "choice_type": "static_numeric",
                "choices": [["Nowhere to go", "", ""]]
            }
        }))
        .unwrap();
        let mut engine = WindowEngine::new(Dispatcher::new(Box::new(NullExporter)));
        let mut console = Console::new(Cursor::new(b"0\n".to_vec()), Vec::new());
        let err = engine
            .run(&set, &mut ResourceStore::new(), &mut console)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::EmptyWindowChain("home".to_string()))
        );
    }

    #[test]
    fn test_union_paths_sorted_and_unique() {
        let mut store = ResourceStore::new();
        store.insert_project("B");
        store.insert_project("A");
        let paths = union_paths(&[IndexList::ProjectPaths, IndexList::ProjectPaths], &store);
        assert_eq!(paths.len(), 2);
        assert!(paths[0].to_string() < paths[1].to_string());
    }
}
