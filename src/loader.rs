//! Bulk loader - builds resources from a tab-indented outline
//!
//! ```text
//! # comment
//! Website
//! 	Launch
//! 		Buy domain - T
//! :Garden
//! 	:Backlog
//! 		:Compost - C
//! ```
//!
//! Indentation depth picks the level (project, story, task). A leading `:`
//! references an existing resource by search text instead of creating one.
//! A trailing ` - X` on a task line sets its status (T, I, R, B, C).

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::dispatch::diagnostic;
use crate::store::{EntityField, ResourceKind, ResourcePath, ResourceStore, Status};

const REFERENCE: char = ':';
const COMMENT: char = '#';

/// What a load did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub projects: usize,
    pub stories: usize,
    pub tasks: usize,
    pub references: usize,
    pub failed: usize,
}

/// Outline parser holding the "current" project and story between lines
pub struct OutlineLoader {
    status_re: Regex,
    project: Option<ResourcePath>,
    story: Option<ResourcePath>,
    report: LoadReport,
}

impl OutlineLoader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            status_re: Regex::new(r"^(.*) - ([A-Za-z])$")?,
            project: None,
            story: None,
            report: LoadReport::default(),
        })
    }

    /// Apply every line of `text` to the store
    pub fn load(mut self, text: &str, store: &mut ResourceStore, out: &mut dyn Write) -> Result<LoadReport> {
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with(COMMENT) {
                continue;
            }
            log::debug!("Outline line {}: {:?}", number + 1, line);
            self.apply(line, store, out)?;
        }
        log::info!("Outline loaded: {:?}", self.report);
        Ok(self.report)
    }

    fn apply(&mut self, line: &str, store: &mut ResourceStore, out: &mut dyn Write) -> Result<()> {
        let body = line.trim_start_matches('\t');
        let depth = line.len() - body.len();
        let (body, reference) = match body.strip_prefix(REFERENCE) {
            Some(rest) => (rest, true),
            None => (body, false),
        };

        match depth {
            0 => self.project_line(body, reference, store, out),
            1 => self.story_line(body, reference, store, out),
            _ => self.task_line(body, reference, store, out),
        }
    }

    fn project_line(&mut self, text: &str, reference: bool, store: &mut ResourceStore, out: &mut dyn Write) -> Result<()> {
        let project = if reference {
            match self.find(ResourceKind::Project, None, text, store, out)? {
                Some(found) => found,
                None => return Ok(()),
            }
        } else {
            self.report.projects += 1;
            // the Backlog story comes along with it
            self.report.stories += 1;
            store.insert_project(text)
        };
        self.project = Some(project);
        self.story = None;
        Ok(())
    }

    fn story_line(&mut self, text: &str, reference: bool, store: &mut ResourceStore, out: &mut dyn Write) -> Result<()> {
        let Some(project) = self.project.clone() else {
            self.report.failed += 1;
            return diagnostic(out, format!("story {} has no project", text));
        };
        let story = if reference {
            match self.find(ResourceKind::Story, Some(&project), text, store, out)? {
                Some(found) => found,
                None => return Ok(()),
            }
        } else {
            match store.insert_story(&project, text) {
                Ok(path) => {
                    self.report.stories += 1;
                    path
                }
                Err(e) => {
                    self.report.failed += 1;
                    return diagnostic(out, e);
                }
            }
        };
        self.story = Some(story);
        Ok(())
    }

    fn task_line(&mut self, line: &str, reference: bool, store: &mut ResourceStore, out: &mut dyn Write) -> Result<()> {
        let (text, status) = self.split_status(line);

        if reference {
            let Some(task) = self.find(ResourceKind::Task, None, text, store, out)? else {
                return Ok(());
            };
            if let Some(status) = status {
                if let Err(e) = store.set(&task, EntityField::Status, status.as_str()) {
                    diagnostic(out, e)?;
                }
            }
            return Ok(());
        }

        let Some(story) = self.story.clone() else {
            self.report.failed += 1;
            return diagnostic(out, format!("task {} has no story", text));
        };
        match store.insert_task(&story, text, status.unwrap_or_default()) {
            Ok(_) => {
                self.report.tasks += 1;
                Ok(())
            }
            Err(e) => {
                self.report.failed += 1;
                diagnostic(out, e)
            }
        }
    }

    /// Split `text - X` into text and status when X is a known code
    fn split_status<'a>(&self, line: &'a str) -> (&'a str, Option<Status>) {
        if let Some(caps) = self.status_re.captures(line) {
            let code = caps.get(2).and_then(|m| m.as_str().chars().next());
            if let (Some(text), Some(status)) = (caps.get(1), code.and_then(Status::from_code)) {
                return (text.as_str(), Some(status));
            }
        }
        (line, None)
    }

    fn find(
        &mut self,
        kind: ResourceKind,
        within: Option<&ResourcePath>,
        text: &str,
        store: &ResourceStore,
        out: &mut dyn Write,
    ) -> Result<Option<ResourcePath>> {
        match store.find_first_match(kind, within, text) {
            Some(found) => {
                self.report.references += 1;
                Ok(Some(found))
            }
            None => {
                self.report.failed += 1;
                diagnostic(out, format!("text {} not found", text))?;
                Ok(None)
            }
        }
    }
}

/// Load an outline from text
pub fn load_str(text: &str, store: &mut ResourceStore, out: &mut dyn Write) -> Result<LoadReport> {
    OutlineLoader::new()?.load(text, store, out)
}

/// Load an outline file
pub fn load_file(path: &Path, store: &mut ResourceStore, out: &mut dyn Write) -> Result<LoadReport> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read outline {}", path.display()))?;
    log::info!("Loading outline from {}", path.display());
    load_str(&text, store, out)
}
