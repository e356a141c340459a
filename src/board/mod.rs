//! Board formatter - projects the store into scrum board tables
//!
//! Each project becomes a table of 6-column rows:
//! - row 0: project title, then blanks
//! - row 1: column header
//! - one block per story, as tall as its fullest status bucket

mod export;

pub use export::{BoardExporter, JsonBoardExporter};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::store::{ResourcePath, ResourceStore, Status};

pub const BOARD_COLUMNS: usize = 6;

pub const HEADER: [&str; BOARD_COLUMNS] = ["Story", "ToDo", "InProgress", "Review", "Blocked", "Complete"];

pub type Row = [String; BOARD_COLUMNS];

/// Scrum board for a single project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub project: String,
    pub rows: Vec<Row>,
}

impl Board {
    /// Build the table for one project
    pub fn for_project(store: &ResourceStore, project: &ResourcePath) -> Option<Self> {
        let title = store.text(project)?.to_string();
        let mut rows: Vec<Row> = vec![
            row_with_first(title.clone()),
            HEADER.map(String::from),
        ];

        for story in store.stories_of(project) {
            rows.extend(story_block(store, story));
        }

        Some(Self { project: title, rows })
    }

    /// Story rows only, without title and header
    pub fn story_rows(&self) -> &[Row] {
        self.rows.get(2..).unwrap_or(&[])
    }
}

/// Build boards for several projects, skipping paths that no longer exist
pub fn format(store: &ResourceStore, projects: &[ResourcePath]) -> Vec<Board> {
    projects
        .iter()
        .filter_map(|p| {
            let board = Board::for_project(store, p);
            if board.is_none() {
                log::warn!("Skipping board for missing project {}", p);
            }
            board
        })
        .collect()
}

fn row_with_first(first: String) -> Row {
    let mut row: Row = Default::default();
    row[0] = first;
    row
}

fn story_block(store: &ResourceStore, story: &ResourcePath) -> Vec<Row> {
    let mut buckets: [Vec<String>; 5] = Default::default();
    for path in store.tasks_of(story) {
        if let Some(task) = store.task(path) {
            let column = Status::ALL
                .iter()
                .position(|s| *s == task.status)
                .unwrap_or(0);
            buckets[column].push(task.card());
        }
    }

    let depth = buckets.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let story_text = store.text(story).unwrap_or_default().to_string();

    (0..depth)
        .map(|i| {
            let mut row = row_with_first(if i == 0 { story_text.clone() } else { String::new() });
            for (column, bucket) in buckets.iter().enumerate() {
                row[column + 1] = bucket.get(i).cloned().unwrap_or_default();
            }
            row
        })
        .collect()
}

/// Print boards as pipe-separated, left-justified columns
pub fn render_console(boards: &[Board], out: &mut dyn Write) -> Result<()> {
    for board in boards {
        let width = board
            .rows
            .iter()
            .flat_map(|row| row.iter().map(|cell| cell.chars().count()))
            .max()
            .unwrap_or(0);
        for row in &board.rows {
            let line: Vec<String> = row
                .iter()
                .map(|cell| format!("{:<pad$}", cell, pad = width + 2))
                .collect();
            writeln!(out, "{}", line.join("|"))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Print the whole hierarchy, one tab per level
pub fn render_tree(store: &ResourceStore, out: &mut dyn Write) -> Result<()> {
    for project in store.project_paths() {
        writeln!(out, "{}", store.text(project).unwrap_or_default())?;
        for story in store.stories_of(project) {
            writeln!(out, "\t{}", store.text(story).unwrap_or_default())?;
            for path in store.tasks_of(story) {
                if let Some(task) = store.task(path) {
                    writeln!(
                        out,
                        "\t\t{}: {}",
                        task.status.as_str().to_uppercase(),
                        task.card()
                    )?;
                }
            }
        }
    }
    Ok(())
}
