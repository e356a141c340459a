//! Error types
//!
//! `StoreError` covers data problems inside the resource store. `ConfigError`
//! covers defects in the declarative window table; those are always fatal.

use thiserror::Error;

use crate::store::ResourceKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Malformed resource path: {0}")]
    MalformedPath(String),

    #[error("Expected a {expected} path, got {path}")]
    WrongKind { expected: ResourceKind, path: String },

    #[error("Unknown status: {0}")]
    InvalidStatus(String),

    #[error("Field {field} is not editable on a {kind}")]
    FieldNotApplicable { field: String, kind: ResourceKind },

    #[error("Index out of sync with resource tree: {0}")]
    Inconsistent(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown window: {0}")]
    UnknownWindow(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Unknown session field: {0}")]
    UnknownField(String),

    #[error("Unknown index list: {0}")]
    UnknownIndex(String),

    #[error("Malformed window {window}: {reason}")]
    MalformedWindow { window: String, reason: String },

    #[error("Window {0} has no next window and the window chain is empty")]
    EmptyWindowChain(String),
}
