//! Resource store - Project/Story/Task tree plus flat index lists
//!
//! The nested tree is the source of truth for entity data. Four index lists
//! (resource ids, project paths, story paths, task paths) mirror it so that
//! "all tasks" or "all stories of project X" never need a recursive walk.
//! Every mutation updates the tree, the indexes and the audit log together.

mod ids;
mod model;
mod path;

pub use ids::{roll_id, roll_id_with, sample_id, ID_LEN};
pub use model::{timestamp, EntityField, Project, Resource, Status, Story, Task};
pub use path::{ResourceKind, ResourcePath};

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, StoreError};

/// Name of the story every project is created with
pub const BACKLOG: &str = "Backlog";

pub const DEFAULT_TIME_FORMAT: &str = model::timestamp::FORMAT;

/// One of the four flat index lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexList {
    Resources,
    ProjectPaths,
    Storys,
    Tasks,
}

impl IndexList {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resources => "resources",
            Self::ProjectPaths => "project_paths",
            Self::Storys => "storys",
            Self::Tasks => "tasks",
        }
    }
}

impl fmt::Display for IndexList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexList {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resources" => Ok(Self::Resources),
            "project_paths" => Ok(Self::ProjectPaths),
            "storys" => Ok(Self::Storys),
            "tasks" => Ok(Self::Tasks),
            _ => Err(ConfigError::UnknownIndex(s.to_string())),
        }
    }
}

/// Hierarchical resource store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStore {
    #[serde(default)]
    projects: BTreeMap<String, Project>,
    #[serde(default)]
    project_paths: Vec<ResourcePath>,
    #[serde(default)]
    storys: Vec<ResourcePath>,
    #[serde(default)]
    tasks: Vec<ResourcePath>,
    #[serde(default)]
    resources: Vec<String>,
    #[serde(default)]
    log: Vec<String>,
    #[serde(skip, default = "default_time_format")]
    time_format: String,
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self {
            projects: BTreeMap::new(),
            project_paths: Vec::new(),
            storys: Vec::new(),
            tasks: Vec::new(),
            resources: Vec::new(),
            log: Vec::new(),
            time_format: default_time_format(),
        }
    }
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format used for audit log timestamps
    pub fn set_time_format(&mut self, format: impl Into<String>) {
        self.time_format = format.into();
    }

    pub fn projects(&self) -> &BTreeMap<String, Project> {
        &self.projects
    }

    pub fn project_paths(&self) -> &[ResourcePath] {
        &self.project_paths
    }

    pub fn story_paths(&self) -> &[ResourcePath] {
        &self.storys
    }

    pub fn task_paths(&self) -> &[ResourcePath] {
        &self.tasks
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Raw entries of an index list, in insertion order
    pub fn index(&self, list: IndexList) -> Vec<String> {
        match list {
            IndexList::Resources => self.resources.clone(),
            IndexList::ProjectPaths => self.project_paths.iter().map(ToString::to_string).collect(),
            IndexList::Storys => self.storys.iter().map(ToString::to_string).collect(),
            IndexList::Tasks => self.tasks.iter().map(ToString::to_string).collect(),
        }
    }

    /// Paths of an index list; `None` for the plain id list
    pub fn index_paths(&self, list: IndexList) -> Option<&[ResourcePath]> {
        match list {
            IndexList::Resources => None,
            IndexList::ProjectPaths => Some(&self.project_paths),
            IndexList::Storys => Some(&self.storys),
            IndexList::Tasks => Some(&self.tasks),
        }
    }

    /// Stories of a project, in index order
    pub fn stories_of<'a>(&'a self, project: &'a ResourcePath) -> impl Iterator<Item = &'a ResourcePath> + 'a {
        self.storys.iter().filter(move |s| project.contains(s))
    }

    /// Tasks of a story (or of a whole project), in index order
    pub fn tasks_of<'a>(&'a self, parent: &'a ResourcePath) -> impl Iterator<Item = &'a ResourcePath> + 'a {
        self.tasks.iter().filter(move |t| parent.contains(t))
    }

    pub fn get(&self, path: &ResourcePath) -> Option<Resource<'_>> {
        let project = self.projects.get(path.project_id())?;
        match path {
            ResourcePath::Project { .. } => Some(Resource::Project(project)),
            ResourcePath::Story { story, .. } => project.storys.get(story).map(Resource::Story),
            ResourcePath::Task { story, task, .. } => project
                .storys
                .get(story)
                .and_then(|s| s.tasks.get(task))
                .map(Resource::Task),
        }
    }

    pub fn task(&self, path: &ResourcePath) -> Option<&Task> {
        match self.get(path)? {
            Resource::Task(task) => Some(task),
            _ => None,
        }
    }

    pub fn contains(&self, path: &ResourcePath) -> bool {
        self.get(path).is_some()
    }

    /// Display text of a resource
    pub fn text(&self, path: &ResourcePath) -> Option<&str> {
        self.get(path).map(|r| r.text())
    }

    /// Read one attribute of a resource
    pub fn get_field(&self, path: &ResourcePath, field: EntityField) -> Result<String, StoreError> {
        let resource = self
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        resource.field(field).ok_or(StoreError::FieldNotApplicable {
            field: field.to_string(),
            kind: path.kind(),
        })
    }

    /// Write one attribute of a resource and log the change
    pub fn set(&mut self, path: &ResourcePath, field: EntityField, value: &str) -> Result<(), StoreError> {
        let status = match field {
            EntityField::Status => Some(value.parse::<Status>()?),
            _ => None,
        };
        if path.kind() != ResourceKind::Task && field != EntityField::Text {
            return Err(StoreError::FieldNotApplicable {
                field: field.to_string(),
                kind: path.kind(),
            });
        }

        let not_found = || StoreError::NotFound(path.to_string());
        let project = self.projects.get_mut(path.project_id()).ok_or_else(not_found)?;
        match path {
            ResourcePath::Project { .. } => project.text = value.to_string(),
            ResourcePath::Story { story, .. } => {
                project.storys.get_mut(story).ok_or_else(not_found)?.text = value.to_string();
            }
            ResourcePath::Task { story, task, .. } => {
                let task = project
                    .storys
                    .get_mut(story)
                    .and_then(|s| s.tasks.get_mut(task))
                    .ok_or_else(not_found)?;
                match (field, status) {
                    (EntityField::Status, Some(status)) => task.status = status,
                    (EntityField::Notes, _) => task.notes = value.to_string(),
                    _ => task.text = value.to_string(),
                }
            }
        }

        let stored = status.map(|s| s.to_string()).unwrap_or_else(|| value.to_string());
        let time = self.stamp();
        self.log
            .push(format!("Updated {}.{} to {} at {}", path, field, stored, time));
        Ok(())
    }

    /// Create a project together with its Backlog story
    pub fn insert_project(&mut self, text: &str) -> ResourcePath {
        let id = roll_id(&self.resources);
        let created = now();
        self.projects.insert(
            id.clone(),
            Project {
                text: text.to_string(),
                time_created: created,
                storys: BTreeMap::new(),
            },
        );
        let path = ResourcePath::project(&id);
        self.project_paths.push(path.clone());
        self.resources.push(id);
        self.record("Added", &path);

        self.attach_story(&path, BACKLOG);
        path
    }

    /// Create a story under an existing project
    pub fn insert_story(&mut self, project: &ResourcePath, text: &str) -> Result<ResourcePath, StoreError> {
        expect_kind(project, ResourceKind::Project)?;
        if !self.contains(project) {
            return Err(StoreError::NotFound(project.to_string()));
        }
        Ok(self.attach_story(project, text))
    }

    fn attach_story(&mut self, project: &ResourcePath, text: &str) -> ResourcePath {
        let id = roll_id(&self.resources);
        let pid = project.project_id().to_string();
        let story = Story {
            project: pid.clone(),
            text: text.to_string(),
            time_created: now(),
            tasks: BTreeMap::new(),
        };
        if let Some(p) = self.projects.get_mut(&pid) {
            p.storys.insert(id.clone(), story);
        }
        let path = ResourcePath::story(pid, &id);
        self.storys.push(path.clone());
        self.resources.push(id);
        self.record("Added", &path);
        path
    }

    /// Create a task under an existing story
    pub fn insert_task(
        &mut self,
        story: &ResourcePath,
        text: &str,
        status: Status,
    ) -> Result<ResourcePath, StoreError> {
        expect_kind(story, ResourceKind::Story)?;
        let id = roll_id(&self.resources);
        let (pid, sid) = (story.project_id().to_string(), story.id().to_string());
        let parent = self
            .projects
            .get_mut(&pid)
            .and_then(|p| p.storys.get_mut(&sid))
            .ok_or_else(|| StoreError::NotFound(story.to_string()))?;
        parent.tasks.insert(
            id.clone(),
            Task {
                project: pid.clone(),
                story: sid.clone(),
                text: text.to_string(),
                status,
                notes: String::new(),
                time_created: now(),
            },
        );
        let path = ResourcePath::task(pid, sid, &id);
        self.tasks.push(path.clone());
        self.resources.push(id);
        self.record("Added", &path);
        Ok(path)
    }

    /// Delete any resource with its descendants; returns how many were removed
    pub fn delete(&mut self, path: &ResourcePath) -> Result<usize, StoreError> {
        match path.kind() {
            ResourceKind::Project => self.delete_project(path),
            ResourceKind::Story => self.delete_story(path),
            ResourceKind::Task => self.delete_task(path),
        }
    }

    /// Delete a project after each of its stories (and their tasks)
    pub fn delete_project(&mut self, path: &ResourcePath) -> Result<usize, StoreError> {
        expect_kind(path, ResourceKind::Project)?;
        if !self.contains(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let stories: Vec<ResourcePath> = self.stories_of(path).cloned().collect();
        let mut removed = 0;
        for story in &stories {
            removed += self.delete_story(story)?;
        }
        self.projects.remove(path.id());
        self.project_paths.retain(|p| p != path);
        self.resources.retain(|r| r != path.id());
        self.record("Deleted", path);
        Ok(removed + 1)
    }

    /// Delete a story after each of its tasks
    pub fn delete_story(&mut self, path: &ResourcePath) -> Result<usize, StoreError> {
        expect_kind(path, ResourceKind::Story)?;
        if !self.contains(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let tasks: Vec<ResourcePath> = self.tasks_of(path).cloned().collect();
        let mut removed = 0;
        for task in &tasks {
            removed += self.delete_task(task)?;
        }
        if let Some(project) = self.projects.get_mut(path.project_id()) {
            project.storys.remove(path.id());
        }
        self.storys.retain(|s| s != path);
        self.resources.retain(|r| r != path.id());
        self.record("Deleted", path);
        Ok(removed + 1)
    }

    pub fn delete_task(&mut self, path: &ResourcePath) -> Result<usize, StoreError> {
        expect_kind(path, ResourceKind::Task)?;
        let removed = match path {
            ResourcePath::Task { project, story, task } => self
                .projects
                .get_mut(project)
                .and_then(|p| p.storys.get_mut(story))
                .and_then(|s| s.tasks.remove(task)),
            _ => None,
        };
        if removed.is_none() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        self.tasks.retain(|t| t != path);
        self.resources.retain(|r| r != path.id());
        self.record("Deleted", path);
        Ok(1)
    }

    /// First resource of `kind` whose text contains `search` (case-insensitive)
    ///
    /// Scans the relevant index list in insertion order. When `within` is set
    /// only resources underneath that path are considered.
    pub fn find_first_match(
        &self,
        kind: ResourceKind,
        within: Option<&ResourcePath>,
        search: &str,
    ) -> Option<ResourcePath> {
        let candidates = match kind {
            ResourceKind::Project => &self.project_paths,
            ResourceKind::Story => &self.storys,
            ResourceKind::Task => &self.tasks,
        };
        let needle = search.to_lowercase();
        let found = candidates
            .iter()
            .filter(|p| within.map_or(true, |w| w.contains(p)))
            .find(|p| {
                self.text(p)
                    .map(|t| t.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .cloned();
        if found.is_none() {
            log::warn!("{} matching '{}' not found", kind, search);
        }
        found
    }

    /// Verify the index lists mirror the nested tree exactly
    pub fn check_consistency(&self) -> Result<(), StoreError> {
        let mut projects = HashSet::new();
        let mut stories = HashSet::new();
        let mut tasks = HashSet::new();
        let mut ids = HashSet::new();

        for (pid, project) in &self.projects {
            projects.insert(ResourcePath::project(pid));
            ids.insert(pid.clone());
            for (sid, story) in &project.storys {
                if &story.project != pid {
                    return Err(StoreError::Inconsistent(format!(
                        "story {} claims project {}",
                        sid, story.project
                    )));
                }
                stories.insert(ResourcePath::story(pid, sid));
                ids.insert(sid.clone());
                for (tid, task) in &story.tasks {
                    if &task.project != pid || &task.story != sid {
                        return Err(StoreError::Inconsistent(format!(
                            "task {} claims parent {}.{}",
                            tid, task.project, task.story
                        )));
                    }
                    tasks.insert(ResourcePath::task(pid, sid, tid));
                    ids.insert(tid.clone());
                }
            }
        }

        compare_index("project_paths", &self.project_paths, &projects)?;
        compare_index("storys", &self.storys, &stories)?;
        compare_index("tasks", &self.tasks, &tasks)?;
        compare_index("resources", &self.resources, &ids)?;

        let total = projects.len() + stories.len() + tasks.len();
        if ids.len() != total {
            return Err(StoreError::Inconsistent(format!(
                "{} resources share an id",
                total - ids.len()
            )));
        }
        Ok(())
    }

    fn record(&mut self, verb: &str, path: &ResourcePath) {
        let time = self.stamp();
        self.log
            .push(format!("{} {} {} at {}", verb, path.kind(), path, time));
    }

    fn stamp(&self) -> String {
        Local::now().format(&self.time_format).to_string()
    }
}

fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn expect_kind(path: &ResourcePath, expected: ResourceKind) -> Result<(), StoreError> {
    if path.kind() == expected {
        Ok(())
    } else {
        Err(StoreError::WrongKind {
            expected,
            path: path.to_string(),
        })
    }
}

fn compare_index<T>(name: &str, index: &[T], tree: &HashSet<T>) -> Result<(), StoreError>
where
    T: std::hash::Hash + Eq + fmt::Display,
{
    let mut seen = HashSet::new();
    for entry in index {
        if !seen.insert(entry) {
            return Err(StoreError::Inconsistent(format!("{} lists {} twice", name, entry)));
        }
        if !tree.contains(entry) {
            return Err(StoreError::Inconsistent(format!("{} lists orphan {}", name, entry)));
        }
    }
    if let Some(missing) = tree.iter().find(|e| !seen.contains(e)) {
        return Err(StoreError::Inconsistent(format!("{} is missing {}", name, missing)));
    }
    Ok(())
}
