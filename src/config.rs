//! Configuration - command line and document parameters

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::store::DEFAULT_TIME_FORMAT;

pub const DEFAULT_DATA_FILE: &str = "scrum.json";
pub const DEFAULT_EXPORT_FILE: &str = "scrum_board.json";

#[derive(Debug, Parser)]
#[command(name = "scrumdesk")]
#[command(about = "Menu-driven scrum board over a single JSON or YAML document")]
#[command(version)]
pub struct Cli {
    /// Document holding windows, resources and the audit log
    #[arg(value_name = "DATA", default_value = DEFAULT_DATA_FILE)]
    pub data: PathBuf,

    /// Where to save on exit (defaults to DATA)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Board export file, overriding the document's parameters
    #[arg(short, long)]
    pub export: Option<PathBuf>,
}

impl Cli {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| self.data.clone())
    }
}

/// `parameters` section of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(default = "default_export_file")]
    pub export_file: PathBuf,
    #[serde(default = "default_time_format")]
    pub time_format: String,
    /// Keys this program does not read, kept for other tools
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_export_file() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_FILE)
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            export_file: default_export_file(),
            time_format: default_time_format(),
            extra: BTreeMap::new(),
        }
    }
}
