//! Document - the single persisted file
//!
//! One JSON (or YAML) document carries the window table, the resource store,
//! the audit log and free-form rendering settings:
//!
//! ```json
//! {
//!   "windows": { "home": { ... } },
//!   "projects": { ... },
//!   "project_paths": [], "storys": [], "tasks": [], "resources": [],
//!   "log": [],
//!   "parameters": { "export_file": "scrum_board.json" },
//!   "formats": { ... }, "excel_fmt": { ... }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Parameters;
use crate::engine::WindowSet;
use crate::store::ResourceStore;

/// Serialization format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub windows: WindowSet,
    #[serde(flatten)]
    pub store: ResourceStore,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub formats: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub excel_fmt: serde_json::Value,
}

impl Document {
    pub fn new(windows: WindowSet) -> Self {
        Self {
            windows,
            store: ResourceStore::new(),
            parameters: Parameters::default(),
            formats: serde_json::Value::Null,
            excel_fmt: serde_json::Value::Null,
        }
    }

    /// Parse and validate a document
    pub fn parse(content: &str, format: Format) -> Result<Self> {
        let mut doc: Document = match format {
            Format::Json => serde_json::from_str(content)?,
            Format::Yaml => serde_yaml::from_str(content)?,
        };
        doc.store
            .check_consistency()
            .context("Resource indexes disagree with the project tree")?;
        doc.store.set_time_format(doc.parameters.time_format.clone());
        Ok(doc)
    }

    /// Load a document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let doc = Self::parse(&content, Format::from_path(path))
            .with_context(|| format!("Invalid document {}", path.display()))?;
        log::info!(
            "Loaded {} windows, {} resources from {}",
            doc.windows.len(),
            doc.store.resources().len(),
            path.display()
        );
        Ok(doc)
    }

    pub fn encode(&self, format: Format) -> Result<String> {
        Ok(match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?,
        })
    }

    /// Rewrite the whole document: temporary sibling first, then rename
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.encode(Format::from_path(path))?;
        let tmp = temp_sibling(path);
        fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        log::info!("Saved document to {}", path.display());
        Ok(())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
