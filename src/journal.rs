//! Append-only mood journal
//!
//! Each completed journal cycle appends one JSON object per line:
//! `{"timestamp":"2026-10-19T08:30:00Z","mood":"😞 Sad","entry":"today was hard"}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Journal I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Journal serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A persisted journal record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub mood: String,
    pub entry: String,
}

impl JournalEntry {
    pub fn new(mood: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            mood: mood.into(),
            entry: entry.into(),
        }
    }

    /// One JSON line, newline-terminated
    pub fn to_line(&self) -> Result<String, JournalError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// JSON-lines journal file shared by all sessions
pub struct JsonlJournal {
    path: PathBuf,
    /// Serializes appends so lines from concurrent sessions never interleave
    write_lock: Mutex<()>,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, creating the file and its directory if needed
    pub async fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        let line = entry.to_line()?;
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(path = %self.path.display(), "Journal entry appended");
        Ok(())
    }
}
