use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dripfeed_store::{Change, JsonDocument};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SourceError;

/// Persisted read position in the lines file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCursor {
    /// Number of valid lines already handed out.
    pub processed_lines: usize,
    pub last_checked: DateTime<Utc>,
}

/// A freshly read line, with an id minted at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLine {
    pub id: String,
    pub text: String,
}

/// Flat text file where every non-blank, non-`#` line is one post.
///
/// Lines are only ever appended by the operator; the cursor counts valid
/// lines, so blank lines and comments can be inserted anywhere without
/// shifting what counts as new.
pub struct LinesFile {
    path: PathBuf,
    cursor: JsonDocument<FileCursor>,
}

impl LinesFile {
    pub fn new(path: impl Into<PathBuf>, cursor_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cursor: JsonDocument::new(cursor_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cursor(&self) -> &JsonDocument<FileCursor> {
        &self.cursor
    }

    /// Valid lines past the cursor. Advances the cursor to the total valid
    /// line count before returning, so a line is never handed out twice even
    /// when the caller later fails to enqueue it.
    pub fn fetch_new_lines(&self) -> Result<Vec<NewLine>, SourceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "lines file not found, skipping");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let valid = valid_lines(&content);

        let fresh = self.cursor.update(|cursor| {
            if cursor.processed_lines >= valid.len() {
                return Change::Clean(Vec::new());
            }
            let fresh: Vec<String> = valid[cursor.processed_lines..].to_vec();
            cursor.processed_lines = valid.len();
            cursor.last_checked = Utc::now();
            Change::Dirty(fresh)
        })?;

        if !fresh.is_empty() {
            info!(count = fresh.len(), path = %self.path.display(), "new lines read");
        }

        Ok(fresh
            .into_iter()
            .map(|text| NewLine {
                id: Uuid::new_v4().to_string(),
                text,
            })
            .collect())
    }
}

fn valid_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
