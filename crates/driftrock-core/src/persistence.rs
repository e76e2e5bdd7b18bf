//! High-score persistence.
//!
//! The only state that outlives a session is one number. [`JsonFileStore`]
//! keeps it in a small JSON document and also reads the older plain-integer
//! format; [`MemoryStore`] keeps it in memory for tests and embedding.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from reading or writing the high score.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The file could not be read or written.
    #[error("high score I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The document could not be encoded or decoded.
    #[error("high score JSON failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The file holds something that is neither format.
    #[error("malformed high score file: {0:?}")]
    Malformed(String),
}

/// Somewhere to keep the best score between sessions.
pub trait HighScoreStore {
    /// Reads the stored high score. A store with nothing in it yields 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value cannot be read.
    fn load(&mut self) -> Result<u64, PersistenceError>;

    /// Replaces the stored high score.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn save(&mut self, high_score: u64) -> Result<(), PersistenceError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct HighScoreRecord {
    high_score: u64,
}

/// High score stored in a JSON file: `{"high_score": N}`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// A store backed by `path`. Nothing is read until [`load`](HighScoreStore::load).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for JsonFileStore {
    fn load(&mut self) -> Result<u64, PersistenceError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no high score file");
                return Ok(0);
            }
            Err(err) => return Err(err.into()),
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        if trimmed.starts_with('{') {
            let record: HighScoreRecord = serde_json::from_str(trimmed)?;
            return Ok(record.high_score);
        }
        // older files hold a bare integer
        trimmed
            .parse::<u64>()
            .map_err(|_| PersistenceError::Malformed(trimmed.to_string()))
    }

    fn save(&mut self, high_score: u64) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&HighScoreRecord { high_score })?;
        fs::write(&self.path, json)?;
        info!(high_score, path = %self.path.display(), "high score saved");
        Ok(())
    }
}

/// High score kept in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    high_score: u64,
    saves: usize,
}

impl MemoryStore {
    /// A store already holding `high_score`.
    #[must_use]
    pub const fn with_high_score(high_score: u64) -> Self {
        Self {
            high_score,
            saves: 0,
        }
    }

    /// The stored value.
    #[must_use]
    pub const fn high_score(&self) -> u64 {
        self.high_score
    }

    /// How many times `save` was called.
    #[must_use]
    pub const fn saves(&self) -> usize {
        self.saves
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&mut self) -> Result<u64, PersistenceError> {
        Ok(self.high_score)
    }

    fn save(&mut self, high_score: u64) -> Result<(), PersistenceError> {
        self.high_score = high_score;
        self.saves += 1;
        Ok(())
    }
}
