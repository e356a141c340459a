//! Typed resource paths
//!
//! The document addresses resources with dotted keys such as
//! `projects.<pid>.storys.<sid>.tasks.<tid>`. Those strings are parsed here
//! once, at the store boundary; everything else works with [`ResourcePath`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::model::EntityField;
use crate::error::StoreError;

pub const PROJECTS: &str = "projects";
pub const STORYS: &str = "storys";
pub const TASKS: &str = "tasks";

/// Kind of resource a path points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    Story,
    Task,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "Project"),
            Self::Story => write!(f, "Story"),
            Self::Task => write!(f, "Task"),
        }
    }
}

/// Canonical address of a Project, Story or Task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourcePath {
    Project {
        project: String,
    },
    Story {
        project: String,
        story: String,
    },
    Task {
        project: String,
        story: String,
        task: String,
    },
}

impl ResourcePath {
    pub fn project(project: impl Into<String>) -> Self {
        Self::Project {
            project: project.into(),
        }
    }

    pub fn story(project: impl Into<String>, story: impl Into<String>) -> Self {
        Self::Story {
            project: project.into(),
            story: story.into(),
        }
    }

    pub fn task(
        project: impl Into<String>,
        story: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self::Task {
            project: project.into(),
            story: story.into(),
            task: task.into(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Project { .. } => ResourceKind::Project,
            Self::Story { .. } => ResourceKind::Story,
            Self::Task { .. } => ResourceKind::Task,
        }
    }

    /// Trailing id - the resource's own id
    pub fn id(&self) -> &str {
        match self {
            Self::Project { project } => project,
            Self::Story { story, .. } => story,
            Self::Task { task, .. } => task,
        }
    }

    pub fn project_id(&self) -> &str {
        match self {
            Self::Project { project } | Self::Story { project, .. } | Self::Task { project, .. } => {
                project
            }
        }
    }

    /// Path of the owning project (a project is its own owner)
    pub fn project_path(&self) -> ResourcePath {
        ResourcePath::project(self.project_id())
    }

    /// Path of the owning story, if this path is below story level
    pub fn story_path(&self) -> Option<ResourcePath> {
        match self {
            Self::Task { project, story, .. } => Some(ResourcePath::story(project, story)),
            _ => None,
        }
    }

    /// Ids from the project down to this resource
    pub fn ids(&self) -> Vec<&str> {
        match self {
            Self::Project { project } => vec![project.as_str()],
            Self::Story { project, story } => vec![project.as_str(), story.as_str()],
            Self::Task {
                project,
                story,
                task,
            } => vec![project.as_str(), story.as_str(), task.as_str()],
        }
    }

    /// Paths from the owning project down to this resource, inclusive
    pub fn lineage(&self) -> Vec<ResourcePath> {
        match self {
            Self::Project { .. } => vec![self.clone()],
            Self::Story { project, .. } => vec![ResourcePath::project(project), self.clone()],
            Self::Task { project, story, .. } => vec![
                ResourcePath::project(project),
                ResourcePath::story(project, story),
                self.clone(),
            ],
        }
    }

    /// Whether `other` is this resource or lives underneath it
    pub fn contains(&self, other: &ResourcePath) -> bool {
        let mine = self.ids();
        let theirs = other.ids();
        theirs.len() >= mine.len() && mine.iter().zip(theirs.iter()).all(|(a, b)| a == b)
    }

    /// Parse a key that may end with an entity field, e.g. `projects.X.text`
    pub fn parse_field_address(s: &str) -> Result<(ResourcePath, Option<EntityField>), StoreError> {
        let segments: Vec<&str> = s.split('.').collect();
        if segments.len() % 2 == 1 && segments.len() > 1 {
            let (last, head) = segments
                .split_last()
                .ok_or_else(|| StoreError::MalformedPath(s.to_string()))?;
            let field = last
                .parse::<EntityField>()
                .map_err(|_| StoreError::MalformedPath(s.to_string()))?;
            let path = Self::from_segments(head, s)?;
            Ok((path, Some(field)))
        } else {
            Ok((Self::from_segments(&segments, s)?, None))
        }
    }

    fn from_segments(segments: &[&str], original: &str) -> Result<Self, StoreError> {
        let malformed = || StoreError::MalformedPath(original.to_string());
        if segments.iter().any(|s| s.is_empty()) {
            return Err(malformed());
        }
        match segments {
            [PROJECTS, p] => Ok(Self::project(*p)),
            [PROJECTS, p, STORYS, s] => Ok(Self::story(*p, *s)),
            [PROJECTS, p, STORYS, s, TASKS, t] => Ok(Self::task(*p, *s, *t)),
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project { project } => write!(f, "{PROJECTS}.{project}"),
            Self::Story { project, story } => write!(f, "{PROJECTS}.{project}.{STORYS}.{story}"),
            Self::Task {
                project,
                story,
                task,
            } => write!(f, "{PROJECTS}.{project}.{STORYS}.{story}.{TASKS}.{task}"),
        }
    }
}

impl FromStr for ResourcePath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('.').collect();
        Self::from_segments(&segments, s)
    }
}

impl TryFrom<String> for ResourcePath {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        let task: ResourcePath = "projects.aB3xY9.storys.Qq1111.tasks.zz0000".parse().unwrap();
        assert_eq!(task.kind(), ResourceKind::Task);
        assert_eq!(task.id(), "zz0000");
        assert_eq!(task.project_id(), "aB3xY9");
        assert_eq!(task.to_string(), "projects.aB3xY9.storys.Qq1111.tasks.zz0000");
        assert_eq!(task.story_path(), Some(ResourcePath::story("aB3xY9", "Qq1111")));
    }

    #[test]
    fn test_malformed_paths() {
        assert!("projects".parse::<ResourcePath>().is_err());
        assert!("projects.".parse::<ResourcePath>().is_err());
        assert!("stories.abc".parse::<ResourcePath>().is_err());
        assert!("projects.a.tasks.b".parse::<ResourcePath>().is_err());
        assert!("".parse::<ResourcePath>().is_err());
    }

    #[test]
    fn test_field_address() {
        let (path, field) = ResourcePath::parse_field_address("projects.abc.text").unwrap();
        assert_eq!(path, ResourcePath::project("abc"));
        assert_eq!(field, Some(EntityField::Text));

        let (path, field) = ResourcePath::parse_field_address("projects.abc.storys.def").unwrap();
        assert_eq!(path.kind(), ResourceKind::Story);
        assert_eq!(field, None);

        assert!(ResourcePath::parse_field_address("projects.abc.colour").is_err());
    }

    #[test]
    fn test_contains() {
        let project = ResourcePath::project("p");
        let story = ResourcePath::story("p", "s");
        let task = ResourcePath::task("p", "s", "t");
        assert!(project.contains(&task));
        assert!(story.contains(&task));
        assert!(!task.contains(&story));
        assert!(!ResourcePath::project("q").contains(&story));
    }

    #[test]
    fn test_serde_as_string() {
        let path = ResourcePath::story("p1", "s1");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"projects.p1.storys.s1\"");
        let back: ResourcePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
