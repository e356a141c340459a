//! Command dispatcher - named operations over the store and session
//!
//! Window records name operations as strings. They are parsed into
//! [`Operation`] when the document loads, so an unknown name fails before the
//! session starts rather than halfway through it.
//!
//! Operations that cannot find what they need (no active selection, a stale
//! path, a bad status value) print a one-line diagnostic and leave state
//! untouched. Only I/O failures on the console surface as errors.

use anyhow::Result;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::board::{self, BoardExporter};
use crate::error::ConfigError;
use crate::loader;
use crate::session::Session;
use crate::store::{EntityField, ResourceKind, ResourcePath, ResourceStore, Status};

/// Every operation a window can invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddProject,
    AddStory,
    AddTask,
    DelProject,
    DelStory,
    DelTask,
    SetActiveAttributes,
    UpdateAttribute,
    RenderBoardConsole,
    RenderBoardExport,
    BulkLoad,
    PrintTree,
    ClearInput,
}

impl Operation {
    pub const ALL: [Operation; 13] = [
        Self::AddProject,
        Self::AddStory,
        Self::AddTask,
        Self::DelProject,
        Self::DelStory,
        Self::DelTask,
        Self::SetActiveAttributes,
        Self::UpdateAttribute,
        Self::RenderBoardConsole,
        Self::RenderBoardExport,
        Self::BulkLoad,
        Self::PrintTree,
        Self::ClearInput,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddProject => "add_project",
            Self::AddStory => "add_story",
            Self::AddTask => "add_task",
            Self::DelProject => "del_project",
            Self::DelStory => "del_story",
            Self::DelTask => "del_task",
            Self::SetActiveAttributes => "set_active_attributes",
            Self::UpdateAttribute => "update_attribute",
            Self::RenderBoardConsole => "render_board_console",
            Self::RenderBoardExport => "render_board_export",
            Self::BulkLoad => "bulk_load",
            Self::PrintTree => "print_tree",
            Self::ClearInput => "clear_input",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scrum_projects" => return Ok(Self::RenderBoardConsole),
            "print_to_excel" => return Ok(Self::RenderBoardExport),
            "read_from_text" => return Ok(Self::BulkLoad),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownOperation(s.to_string()))
    }
}

/// Attributes a user may edit on a resource of the given kind
pub fn editable_attributes(kind: ResourceKind) -> Vec<EntityField> {
    match kind {
        ResourceKind::Project | ResourceKind::Story => vec![EntityField::Text],
        ResourceKind::Task => vec![EntityField::Text, EntityField::Status, EntityField::Notes],
    }
}

/// Write a recoverable diagnostic to the console
pub fn diagnostic(out: &mut dyn Write, message: impl fmt::Display) -> Result<()> {
    log::warn!("{}", message);
    writeln!(out, "Error: {}", message)?;
    Ok(())
}

/// Executes operations against the store and session
pub struct Dispatcher {
    exporter: Box<dyn BoardExporter>,
}

impl Dispatcher {
    pub fn new(exporter: Box<dyn BoardExporter>) -> Self {
        Self { exporter }
    }

    pub fn invoke(
        &mut self,
        op: Operation,
        store: &mut ResourceStore,
        session: &mut Session,
        out: &mut dyn Write,
    ) -> Result<()> {
        log::debug!("Dispatching {}", op);
        match op {
            Operation::AddProject => {
                let path = store.insert_project(&session.input_text);
                log::info!("Added project {}", path);
            }
            Operation::AddStory => {
                let Some(project) = session.active_project.clone() else {
                    return diagnostic(out, "no active project selected");
                };
                match store.insert_story(&project, &session.input_text) {
                    Ok(path) => log::info!("Added story {}", path),
                    Err(e) => diagnostic(out, e)?,
                }
            }
            Operation::AddTask => {
                let Some(story) = self.story_for_task(session) else {
                    return diagnostic(out, "no active story selected");
                };
                match store.insert_task(&story, &session.input_text, Status::default()) {
                    Ok(path) => log::info!("Added task {}", path),
                    Err(e) => diagnostic(out, e)?,
                }
            }
            Operation::DelProject => {
                Self::delete(session.active_project.clone(), "project", store, session, out)?;
            }
            Operation::DelStory => {
                Self::delete(session.active_story.clone(), "story", store, session, out)?;
            }
            Operation::DelTask => {
                Self::delete(session.active_task.clone(), "task", store, session, out)?;
            }
            Operation::SetActiveAttributes => match &session.active_resource {
                Some(resource) => session.active_attributes = editable_attributes(resource.kind()),
                None => diagnostic(out, "no active resource selected")?,
            },
            Operation::UpdateAttribute => {
                let (Some(resource), Some(field)) =
                    (session.active_resource.clone(), session.selected_attribute)
                else {
                    return diagnostic(out, "no attribute selected");
                };
                if let Err(e) = store.set(&resource, field, &session.input_text) {
                    diagnostic(out, e)?;
                }
            }
            Operation::RenderBoardConsole => {
                let boards = board::format(store, store.project_paths());
                board::render_console(&boards, out)?;
            }
            Operation::RenderBoardExport => {
                let boards = board::format(store, store.project_paths());
                if let Err(e) = self.exporter.export(&boards) {
                    diagnostic(out, format!("export failed: {:#}", e))?;
                }
            }
            Operation::BulkLoad => {
                let file = session.input_text.trim().to_string();
                if let Err(e) = loader::load_file(Path::new(&file), store, out) {
                    diagnostic(out, format!("could not load {}: {:#}", file, e))?;
                }
            }
            Operation::PrintTree => board::render_tree(store, out)?,
            Operation::ClearInput => session.input_text.clear(),
        }
        Ok(())
    }

    /// Active story, falling back to the task's story when only a task is selected
    fn story_for_task(&self, session: &Session) -> Option<ResourcePath> {
        session
            .active_story
            .clone()
            .or_else(|| session.active_task.as_ref().and_then(ResourcePath::story_path))
    }

    fn delete(
        target: Option<ResourcePath>,
        what: &str,
        store: &mut ResourceStore,
        session: &mut Session,
        out: &mut dyn Write,
    ) -> Result<()> {
        let Some(path) = target else {
            return diagnostic(out, format!("no active {} selected", what));
        };
        match store.delete(&path) {
            Ok(removed) => {
                log::info!("Deleted {} ({} resources)", path, removed);
                session.forget(&path);
                Ok(())
            }
            Err(e) => diagnostic(out, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Recorder {
        boards: Rc<RefCell<Vec<Board>>>,
    }

    impl BoardExporter for Recorder {
        fn export(&mut self, boards: &[Board]) -> Result<()> {
            self.boards.borrow_mut().extend_from_slice(boards);
            Ok(())
        }
    }

    fn run(
        dispatcher: &mut Dispatcher,
        op: Operation,
        store: &mut ResourceStore,
        session: &mut Session,
    ) -> String {
        let mut out = Vec::new();
        dispatcher.invoke(op, store, session, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Box::new(Recorder::default()))
    }

    #[test]
    fn test_operation_names() {
        assert_eq!("add_project".parse::<Operation>().unwrap(), Operation::AddProject);
        assert_eq!("scrum_projects".parse::<Operation>().unwrap(), Operation::RenderBoardConsole);
        assert_eq!(
            "launch_rockets".parse::<Operation>(),
            Err(ConfigError::UnknownOperation("launch_rockets".to_string()))
        );
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert_eq!("read_from_text".parse::<Operation>().unwrap(), Operation::BulkLoad);
        assert_eq!("print_to_excel".parse::<Operation>().unwrap(), Operation::RenderBoardExport);
    }

    #[test]
    fn test_add_and_delete_flow() {
        let mut d = dispatcher();
        let mut store = ResourceStore::new();
        let mut session = Session::new();

        session.input_text = "Website".into();
        run(&mut d, Operation::AddProject, &mut store, &mut session);
        let project = store.project_paths()[0].clone();

        session.active_project = Some(project.clone());
        session.input_text = "Launch".into();
        run(&mut d, Operation::AddStory, &mut store, &mut session);
        let story = store.find_first_match(ResourceKind::Story, Some(&project), "launch").unwrap();

        session.active_story = Some(story.clone());
        session.input_text = "Buy domain".into();
        run(&mut d, Operation::AddTask, &mut store, &mut session);
        let task = store.task_paths()[0].clone();
        assert_eq!(store.task(&task).unwrap().status, Status::ToDo);

        session.active_task = Some(task);
        run(&mut d, Operation::DelStory, &mut store, &mut session);
        assert!(session.active_story.is_none());
        assert!(session.active_task.is_none());
        assert_eq!(session.active_project, Some(project));
        assert_eq!(store.story_paths().len(), 1);
        assert_eq!(store.task_paths().len(), 0);
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_missing_selection_is_diagnostic() {
        let mut d = dispatcher();
        let mut store = ResourceStore::new();
        let mut session = Session::new();

        let out = run(&mut d, Operation::DelProject, &mut store, &mut session);
        assert_eq!(out, "Error: no active project selected\n");
        let out = run(&mut d, Operation::AddTask, &mut store, &mut session);
        assert_eq!(out, "Error: no active story selected\n");
        assert!(store.log().is_empty());
    }

    #[test]
    fn test_attribute_editing() {
        let mut d = dispatcher();
        let mut store = ResourceStore::new();
        let mut session = Session::new();
        let project = store.insert_project("Website");
        let backlog = store.story_paths()[0].clone();
        let task = store.insert_task(&backlog, "Buy domain", Status::ToDo).unwrap();

        session.active_resource = Some(project);
        run(&mut d, Operation::SetActiveAttributes, &mut store, &mut session);
        assert_eq!(session.active_attributes, vec![EntityField::Text]);

        session.active_resource = Some(task.clone());
        run(&mut d, Operation::SetActiveAttributes, &mut store, &mut session);
        assert_eq!(session.active_attributes.len(), 3);

        session.selected_attribute = Some(EntityField::Status);
        session.input_text = "blocked".into();
        run(&mut d, Operation::UpdateAttribute, &mut store, &mut session);
        assert_eq!(store.task(&task).unwrap().status, Status::Blocked);
        assert!(store.log().last().unwrap().contains(".status to Blocked"));

        session.input_text = "whenever".into();
        let log_len = store.log().len();
        let out = run(&mut d, Operation::UpdateAttribute, &mut store, &mut session);
        assert!(out.starts_with("Error: Unknown status"));
        assert_eq!(store.log().len(), log_len);
    }

    #[test]
    fn test_export_hands_boards_to_exporter() {
        let recorder = Recorder::default();
        let mut d = Dispatcher::new(Box::new(recorder.clone()));
        let mut store = ResourceStore::new();
        let mut session = Session::new();
        store.insert_project("Website");
        store.insert_project("Garden");

        run(&mut d, Operation::RenderBoardExport, &mut store, &mut session);
        let boards = recorder.boards.borrow();
        assert_eq!(boards.len(), 2);
        assert_eq!(boards[1].project, "Garden");
    }

    #[test]
    fn test_bulk_load_missing_file() {
        let mut d = dispatcher();
        let mut store = ResourceStore::new();
        let mut session = Session::new();
        session.input_text = "/definitely/not/here.txt".into();
        let out = run(&mut d, Operation::BulkLoad, &mut store, &mut session);
        assert!(out.starts_with("Error: could not load /definitely/not/here.txt"));
    }
}
