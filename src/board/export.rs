//! Board export - hands formatted boards to an outside renderer

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use super::Board;

/// Receiver of formatted boards (spreadsheet, document, ...)
///
/// Implementations get the raw 6-column rows and do their own styling.
pub trait BoardExporter {
    fn export(&mut self, boards: &[Board]) -> Result<()>;
}

/// Writes boards as pretty JSON, one entry per project
#[derive(Debug, Clone)]
pub struct JsonBoardExporter {
    path: PathBuf,
}

impl JsonBoardExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BoardExporter for JsonBoardExporter {
    fn export(&mut self, boards: &[Board]) -> Result<()> {
        let json = serde_json::to_string_pretty(boards)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write board export {}", self.path.display()))?;
        log::info!("Exported {} boards to {}", boards.len(), self.path.display());
        Ok(())
    }
}
