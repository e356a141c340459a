//! Session state - the current selection carried between windows
//!
//! Window records address session fields by name (`active_project`,
//! `input_text`, ...). Those names are parsed once into [`SessionField`] and
//! every read or write goes through the accessor table below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, StoreError};
use crate::store::{EntityField, ResourcePath};

/// Addressable session field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionField {
    ActiveProject,
    ActiveStory,
    ActiveTask,
    ActiveResource,
    ActiveAttributes,
    SelectedAttribute,
    ActiveFilter,
    InputText,
}

/// The kind of value a session field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Path,
    Attribute,
    Text,
}

impl SessionField {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::ActiveProject | Self::ActiveStory | Self::ActiveTask | Self::ActiveResource => {
                FieldKind::Path
            }
            Self::ActiveAttributes | Self::SelectedAttribute => FieldKind::Attribute,
            Self::ActiveFilter | Self::InputText => FieldKind::Text,
        }
    }

    /// Whether a value of `kind` can be stored here without a parse failure
    pub fn accepts(&self, kind: FieldKind) -> bool {
        let own = self.kind();
        own == FieldKind::Text || own == kind
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActiveProject => "active_project",
            Self::ActiveStory => "active_story",
            Self::ActiveTask => "active_task",
            Self::ActiveResource => "active_resource",
            Self::ActiveAttributes => "active_attributes",
            Self::SelectedAttribute => "selected_attribute",
            Self::ActiveFilter => "active_filter",
            Self::InputText => "input_text",
        }
    }
}

impl fmt::Display for SessionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active_project" => Ok(Self::ActiveProject),
            "active_story" => Ok(Self::ActiveStory),
            "active_task" => Ok(Self::ActiveTask),
            "active_resource" => Ok(Self::ActiveResource),
            "active_attributes" => Ok(Self::ActiveAttributes),
            "selected_attribute" => Ok(Self::SelectedAttribute),
            "active_filter" => Ok(Self::ActiveFilter),
            "input_text" => Ok(Self::InputText),
            _ => Err(ConfigError::UnknownField(s.to_string())),
        }
    }
}

/// A session represents one interactive run
#[derive(Debug, Clone)]
pub struct Session {
    pub started_at: DateTime<Utc>,
    pub active_project: Option<ResourcePath>,
    pub active_story: Option<ResourcePath>,
    pub active_task: Option<ResourcePath>,
    pub active_resource: Option<ResourcePath>,
    pub active_attributes: Vec<EntityField>,
    pub selected_attribute: Option<EntityField>,
    pub active_filter: String,
    pub input_text: String,
    pub window_chain: VecDeque<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a new session with nothing selected
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            active_project: None,
            active_story: None,
            active_task: None,
            active_resource: None,
            active_attributes: Vec::new(),
            selected_attribute: None,
            active_filter: String::new(),
            input_text: String::new(),
            window_chain: VecDeque::new(),
        }
    }

    /// Current value of a field as text ("" when unset)
    pub fn get_text(&self, field: SessionField) -> String {
        let path_text = |p: &Option<ResourcePath>| p.as_ref().map(ToString::to_string).unwrap_or_default();
        match field {
            SessionField::ActiveProject => path_text(&self.active_project),
            SessionField::ActiveStory => path_text(&self.active_story),
            SessionField::ActiveTask => path_text(&self.active_task),
            SessionField::ActiveResource => path_text(&self.active_resource),
            SessionField::ActiveAttributes => self
                .active_attributes
                .iter()
                .map(EntityField::as_str)
                .collect::<Vec<_>>()
                .join(","),
            SessionField::SelectedAttribute => self
                .selected_attribute
                .map(|a| a.to_string())
                .unwrap_or_default(),
            SessionField::ActiveFilter => self.active_filter.clone(),
            SessionField::InputText => self.input_text.clone(),
        }
    }

    /// Field contents as a list of choices
    pub fn values(&self, field: SessionField) -> Vec<String> {
        match field {
            SessionField::ActiveAttributes => self
                .active_attributes
                .iter()
                .map(|a| a.to_string())
                .collect(),
            other => {
                let text = self.get_text(other);
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text]
                }
            }
        }
    }

    /// Store a raw value into a field, parsing it into the field's type
    pub fn set_text(&mut self, field: SessionField, value: &str) -> Result<(), StoreError> {
        let parse_path = |v: &str| -> Result<Option<ResourcePath>, StoreError> {
            if v.is_empty() {
                Ok(None)
            } else {
                v.parse().map(Some)
            }
        };
        match field {
            SessionField::ActiveProject => self.active_project = parse_path(value)?,
            SessionField::ActiveStory => self.active_story = parse_path(value)?,
            SessionField::ActiveTask => self.active_task = parse_path(value)?,
            SessionField::ActiveResource => self.active_resource = parse_path(value)?,
            SessionField::ActiveAttributes => {
                self.active_attributes = value
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::parse::<EntityField>)
                    .collect::<Result<_, _>>()?;
            }
            SessionField::SelectedAttribute => {
                self.selected_attribute = if value.is_empty() {
                    None
                } else {
                    Some(value.parse()?)
                };
            }
            SessionField::ActiveFilter => self.active_filter = value.to_string(),
            SessionField::InputText => self.input_text = value.to_string(),
        }
        Ok(())
    }

    /// Drop every selection at or below a deleted resource
    pub fn forget(&mut self, removed: &ResourcePath) {
        for slot in [
            &mut self.active_project,
            &mut self.active_story,
            &mut self.active_task,
            &mut self.active_resource,
        ] {
            if slot.as_ref().is_some_and(|p| removed.contains(p)) {
                *slot = None;
            }
        }
    }

    /// Replace the queue of upcoming windows
    pub fn set_chain<I, S>(&mut self, windows: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.window_chain = windows.into_iter().map(Into::into).collect();
    }

    /// Pop the next queued window
    pub fn next_window(&mut self) -> Option<String> {
        self.window_chain.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = Session::new();
        assert!(session.active_project.is_none());
        assert!(session.window_chain.is_empty());
        assert_eq!(session.get_text(SessionField::ActiveProject), "");
    }

    #[test]
    fn test_field_round_trip() {
        let mut session = Session::new();
        session
            .set_text(SessionField::ActiveStory, "projects.abc123.storys.def456")
            .unwrap();
        assert_eq!(
            session.active_story,
            Some(ResourcePath::story("abc123", "def456"))
        );
        assert_eq!(
            session.get_text(SessionField::ActiveStory),
            "projects.abc123.storys.def456"
        );

        session.set_text(SessionField::SelectedAttribute, "status").unwrap();
        assert_eq!(session.selected_attribute, Some(EntityField::Status));

        assert!(session.set_text(SessionField::ActiveTask, "nonsense").is_err());
        assert!(session.set_text(SessionField::SelectedAttribute, "colour").is_err());
    }

    #[test]
    fn test_attribute_values() {
        let mut session = Session::new();
        session.active_attributes = vec![EntityField::Text, EntityField::Status];
        assert_eq!(session.values(SessionField::ActiveAttributes), vec!["text", "status"]);
        assert!(session.values(SessionField::InputText).is_empty());
    }

    #[test]
    fn test_window_chain() {
        let mut session = Session::new();
        session.set_chain(["update_attribute", "home"]);
        assert_eq!(session.next_window().as_deref(), Some("update_attribute"));
        assert_eq!(session.next_window().as_deref(), Some("home"));
        assert_eq!(session.next_window(), None);
    }

    #[test]
    fn test_forget_clears_descendants() {
        let mut session = Session::new();
        session.active_project = Some(ResourcePath::project("p"));
        session.active_story = Some(ResourcePath::story("p", "s"));
        session.active_task = Some(ResourcePath::task("p", "s", "t"));
        session.active_resource = Some(ResourcePath::story("p", "other"));

        session.forget(&ResourcePath::story("p", "s"));
        assert!(session.active_project.is_some());
        assert!(session.active_story.is_none());
        assert!(session.active_task.is_none());
        assert!(session.active_resource.is_some());

        session.forget(&ResourcePath::project("p"));
        assert!(session.active_project.is_none());
        assert!(session.active_resource.is_none());
    }

    #[test]
    fn test_field_kinds() {
        assert!(SessionField::ActiveStory.accepts(FieldKind::Path));
        assert!(!SessionField::ActiveStory.accepts(FieldKind::Text));
        assert!(SessionField::SelectedAttribute.accepts(FieldKind::Attribute));
        assert!(!SessionField::SelectedAttribute.accepts(FieldKind::Path));
        assert!(SessionField::InputText.accepts(FieldKind::Path));
        assert!(SessionField::ActiveFilter.accepts(FieldKind::Attribute));
    }

    #[test]
    fn test_unknown_field_name() {
        assert_eq!(
            "active_colour".parse::<SessionField>(),
            Err(ConfigError::UnknownField("active_colour".to_string()))
        );
    }
}
