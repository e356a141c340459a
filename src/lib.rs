//! ScrumDesk - menu-driven scrum board manager
//!
//! A console state machine, described entirely by window records in the data
//! document, that edits a Project → Story → Task hierarchy and renders it as
//! kanban-style boards.

pub mod board;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod engine;
pub mod error;
pub mod loader;
pub mod resolver;
pub mod session;
pub mod store;

// Re-exports
pub use board::{Board, BoardExporter, JsonBoardExporter};
pub use dispatch::{Dispatcher, Operation};
pub use document::{Document, Format};
pub use engine::{Console, WindowEngine, WindowSet};
pub use error::{ConfigError, StoreError};
pub use session::{Session, SessionField};
pub use store::{ResourceKind, ResourcePath, ResourceStore, Status};

/// Result type alias
pub type Result<T> = anyhow::Result<T>;
