//! Resource model - projects own stories, stories own tasks

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Task status - normalised on the way in, canonical on the way out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Status {
    #[default]
    ToDo,
    InProgress,
    Review,
    Blocked,
    Complete,
}

impl Status {
    /// Board column order
    pub const ALL: [Status; 5] = [
        Status::ToDo,
        Status::InProgress,
        Status::Review,
        Status::Blocked,
        Status::Complete,
    ];

    /// Single-letter outline codes: T, I, R, B, C
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'T' => Some(Self::ToDo),
            'I' => Some(Self::InProgress),
            'R' => Some(Self::Review),
            'B' => Some(Self::Blocked),
            'C' => Some(Self::Complete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToDo => "ToDo",
            Self::InProgress => "InProgress",
            Self::Review => "Review",
            Self::Blocked => "Blocked",
            Self::Complete => "Complete",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = StoreError;

    /// Accepts `todo`, `TODO`, `In Progress`, `in-progress`, `in review`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_uppercase();
        match key.as_str() {
            "TODO" => Ok(Self::ToDo),
            "INPROGRESS" => Ok(Self::InProgress),
            "REVIEW" | "INREVIEW" => Ok(Self::Review),
            "BLOCKED" => Ok(Self::Blocked),
            "COMPLETE" => Ok(Self::Complete),
            _ => Err(StoreError::InvalidStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for Status {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

/// Editable entity attribute, addressed by name from window records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityField {
    Text,
    Status,
    Notes,
}

impl EntityField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Status => "status",
            Self::Notes => "notes",
        }
    }
}

impl fmt::Display for EntityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "status" => Ok(Self::Status),
            "notes" => Ok(Self::Notes),
            _ => Err(StoreError::MalformedPath(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub text: String,
    #[serde(with = "timestamp")]
    pub time_created: NaiveDateTime,
    #[serde(default)]
    pub storys: BTreeMap<String, Story>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub project: String,
    pub text: String,
    #[serde(with = "timestamp")]
    pub time_created: NaiveDateTime,
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub project: String,
    pub story: String,
    pub text: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub notes: String,
    #[serde(with = "timestamp")]
    pub time_created: NaiveDateTime,
}

impl Task {
    /// Text followed by notes, as shown on board cards
    pub fn card(&self) -> String {
        if self.notes.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", self.text, self.notes)
        }
    }
}

/// Borrowed view of any resource
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Project(&'a Project),
    Story(&'a Story),
    Task(&'a Task),
}

impl<'a> Resource<'a> {
    pub fn text(&self) -> &'a str {
        match *self {
            Self::Project(p) => &p.text,
            Self::Story(s) => &s.text,
            Self::Task(t) => &t.text,
        }
    }

    /// Read an attribute as display text
    pub fn field(&self, field: EntityField) -> Option<String> {
        match (self, field) {
            (_, EntityField::Text) => Some(self.text().to_string()),
            (Self::Task(t), EntityField::Status) => Some(t.status.to_string()),
            (Self::Task(t), EntityField::Notes) => Some(t.notes.clone()),
            _ => None,
        }
    }
}

/// Serde helper for `%Y_%m_%d_%H_%M_%S` timestamps
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
