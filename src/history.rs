//! Operation history for undo support.
//!
//! Every real run records the mutations it performed in a JSON history
//! file inside the source directory, so the run can be reverted later.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the history file written into the source directory.
pub const HISTORY_FILE_NAME: &str = ".datetidy_history.json";

/// Errors for history reading, writing, and undo.
#[derive(Debug)]
pub enum HistoryError {
    /// Failed to write the history file.
    WriteFailed { source: io::Error },
    /// Failed to read the history file.
    ReadFailed { source: io::Error },
    /// The history file exists but cannot be parsed.
    InvalidFormat { reason: String },
    /// No history file exists, so there is nothing to undo.
    NoHistory,
    /// The base directory does not exist.
    InvalidBasePath(PathBuf),
}

impl std::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryError::WriteFailed { source } => {
                write!(f, "Failed to write history file: {}", source)
            }
            HistoryError::ReadFailed { source } => {
                write!(f, "Failed to read history file: {}", source)
            }
            HistoryError::InvalidFormat { reason } => {
                write!(f, "Invalid history file format: {}", reason)
            }
            HistoryError::NoHistory => write!(f, "No previous run found to undo"),
            HistoryError::InvalidBasePath(path) => {
                write!(f, "Invalid base path {}", path.display())
            }
        }
    }
}

impl std::error::Error for HistoryError {}

/// How an entry was materialized at its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// The entry was renamed into place.
    Moved,
    /// A hard link was created at the destination; the source remains.
    HardLinked,
    /// A symbolic link to the source was created at the destination.
    Symlinked,
}

/// One recorded filesystem mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Where the entry was before the run.
    pub original_path: PathBuf,
    /// Where the entry (or link to it) is now.
    pub new_path: PathBuf,
    pub kind: OperationKind,
}

/// The full record of one run, persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLog {
    /// RFC 3339 timestamp of the run.
    pub timestamp: String,
    /// The scanned source directory.
    pub base_path: PathBuf,
    /// All mutations performed, in traversal order.
    pub operations: Vec<Operation>,
}

impl OperationLog {
    /// Creates an empty log for a run over `base_path`.
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            base_path,
            operations: Vec::new(),
        }
    }

    /// Adds one operation to this log.
    pub fn add_operation(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    fn history_file_path(base_path: &Path) -> PathBuf {
        base_path.join(HISTORY_FILE_NAME)
    }

    /// Saves this log as pretty-printed JSON in `base_path`.
    pub fn save(&self, base_path: &Path) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| HistoryError::InvalidFormat {
            reason: format!("JSON serialization failed: {}", e),
        })?;

        fs::write(Self::history_file_path(base_path), json)
            .map_err(|e| HistoryError::WriteFailed { source: e })
    }

    /// Loads the log from `base_path`, or `None` if no history exists.
    pub fn load(base_path: &Path) -> Result<Option<Self>, HistoryError> {
        let history_path = Self::history_file_path(base_path);
        if !history_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&history_path)
            .map_err(|e| HistoryError::ReadFailed { source: e })?;

        let log = serde_json::from_str(&json).map_err(|e| HistoryError::InvalidFormat {
            reason: e.to_string(),
        })?;
        Ok(Some(log))
    }

    /// Deletes the history file, if present.
    pub fn delete(base_path: &Path) -> Result<(), HistoryError> {
        let history_path = Self::history_file_path(base_path);
        if history_path.exists() {
            fs::remove_file(&history_path).map_err(|e| HistoryError::WriteFailed { source: e })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_operation(kind: OperationKind) -> Operation {
        Operation {
            original_path: PathBuf::from("/src/photo.jpg"),
            new_path: PathBuf::from("/src/2016/February/photo.jpg"),
            kind,
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let mut log = OperationLog::new(base_path.to_path_buf());
        log.add_operation(sample_operation(OperationKind::Moved));
        log.add_operation(sample_operation(OperationKind::HardLinked));
        log.save(base_path).expect("Failed to save history");

        let loaded = OperationLog::load(base_path)
            .expect("Failed to load history")
            .expect("History file missing");
        assert_eq!(loaded.operations.len(), 2);
        assert_eq!(loaded.operations[0].kind, OperationKind::Moved);
        assert_eq!(loaded.operations[1].kind, OperationKind::HardLinked);
        assert_eq!(loaded.base_path, base_path);
    }

    #[test]
    fn test_load_without_history_returns_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let loaded = OperationLog::load(temp_dir.path()).expect("Load failed");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_corrupt_history_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join(HISTORY_FILE_NAME), "not json")
            .expect("Failed to write file");

        let result = OperationLog::load(temp_dir.path());
        assert!(matches!(result, Err(HistoryError::InvalidFormat { .. })));
    }

    #[test]
    fn test_delete_removes_history_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let log = OperationLog::new(base_path.to_path_buf());
        log.save(base_path).expect("Failed to save history");
        assert!(base_path.join(HISTORY_FILE_NAME).exists());

        OperationLog::delete(base_path).expect("Failed to delete history");
        assert!(!base_path.join(HISTORY_FILE_NAME).exists());
    }

    #[test]
    fn test_delete_is_a_noop_without_history() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        OperationLog::delete(temp_dir.path()).expect("Delete should not fail");
    }
}
