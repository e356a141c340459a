//! Path resolver - `@field` substitution for dotted tokens
//!
//! A token such as `@active_story.text` is split on dots; every segment that
//! starts with `@` is replaced by the named session field before the pieces
//! are joined again. Resolution is textual. Whether the result exists is the
//! caller's business.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::session::{Session, SessionField};
use crate::store::{EntityField, ResourcePath, ResourceStore};

pub const MARKER: char = '@';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(SessionField),
}

/// Parsed resolver token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token {
    segments: Vec<Segment>,
}

impl Token {
    /// Substitute session fields and join the segments
    pub fn resolve(&self, session: &Session) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Field(field) => session.get_text(*field),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Resolve, then read the addressed value from the store
    ///
    /// A token naming a resource without a trailing field reads its text.
    pub fn lookup(&self, session: &Session, store: &ResourceStore) -> Option<String> {
        let concrete = self.resolve(session);
        let (path, field) = match ResourcePath::parse_field_address(&concrete) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Token {} resolved to {}: {}", self, concrete, e);
                return None;
            }
        };
        store.get_field(&path, field.unwrap_or(EntityField::Text)).ok()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw: Vec<String> = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Field(field) => format!("{MARKER}{field}"),
            })
            .collect();
        f.write_str(&raw.join("."))
    }
}

impl FromStr for Token {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split('.')
            .map(|segment| match segment.strip_prefix(MARKER) {
                Some(name) => name.parse().map(Segment::Field),
                None => Ok(Segment::Literal(segment.to_string())),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { segments })
    }
}

impl TryFrom<String> for Token {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.to_string()
    }
}

/// Resolve a raw token string against the session
pub fn resolve(token: &str, session: &Session) -> Result<String, ConfigError> {
    Ok(token.parse::<Token>()?.resolve(session))
}
