//! Reverts the most recent grouping run.
//!
//! Moves are renamed back to their original locations; hard links and
//! symlinks created at destinations are removed (the originals were never
//! touched). The created date directories are left in place.

use crate::history::{HistoryError, Operation, OperationKind, OperationLog};
use std::fs;
use std::path::{Path, PathBuf};

/// What an undo run accomplished.
#[derive(Debug)]
pub struct UndoReport {
    /// Entries moved back to their original locations.
    pub restored_files: usize,
    /// Destination links (hard or symbolic) removed.
    pub removed_links: usize,
    /// Operations that could not be reverted, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Operations skipped because the destination no longer exists.
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    fn new() -> Self {
        Self {
            restored_files: 0,
            removed_links: 0,
            failed_restores: Vec::new(),
            skipped_files: Vec::new(),
        }
    }

    /// True if every recorded operation was reverted.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

/// Reverts grouping runs from the recorded history.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent run recorded in `base_path`'s history file.
    ///
    /// Operations are reverted in reverse order. The history file is
    /// deleted only when every operation reverted cleanly, so a partial
    /// undo can be retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the base path does not exist, there is no
    /// history, or the history file cannot be read.
    pub fn undo(base_path: &Path) -> Result<UndoReport, HistoryError> {
        if !base_path.exists() {
            return Err(HistoryError::InvalidBasePath(base_path.to_path_buf()));
        }

        let log = OperationLog::load(base_path)?.ok_or(HistoryError::NoHistory)?;

        let mut report = UndoReport::new();
        for operation in log.operations.iter().rev() {
            let result = match operation.kind {
                OperationKind::Moved => Self::restore_move(operation).map(|_| {
                    report.restored_files += 1;
                }),
                OperationKind::HardLinked | OperationKind::Symlinked => {
                    Self::remove_link(operation).map(|_| {
                        report.removed_links += 1;
                    })
                }
            };
            if let Err((path, reason)) = result {
                if reason.contains("not found") {
                    report.skipped_files.push((path, reason));
                } else {
                    report.failed_restores.push((path, reason));
                }
            }
        }

        if report.is_complete_success()
            && let Err(e) = OperationLog::delete(base_path)
        {
            eprintln!("Warning: Could not delete history file: {}", e);
        }

        Ok(report)
    }

    /// Moves an entry back to where it was. A conflicting file at the
    /// original location is backed up with a timestamp suffix first.
    fn restore_move(operation: &Operation) -> Result<(), (PathBuf, String)> {
        if !operation.new_path.exists() {
            return Err((
                operation.new_path.clone(),
                "File not found at expected location".to_string(),
            ));
        }

        if operation.original_path.exists() {
            let backup_path = Self::generate_backup_path(&operation.original_path);
            fs::rename(&operation.original_path, &backup_path).map_err(|e| {
                (
                    operation.original_path.clone(),
                    format!("Could not back up conflicting file: {}", e),
                )
            })?;
        }

        fs::rename(&operation.new_path, &operation.original_path).map_err(|e| {
            (
                operation.new_path.clone(),
                format!("Failed to restore file: {}", e),
            )
        })
    }

    /// Removes a destination link; the original entry was never moved.
    /// Uses `symlink_metadata` so a dangling symlink is still removable.
    fn remove_link(operation: &Operation) -> Result<(), (PathBuf, String)> {
        match fs::symlink_metadata(&operation.new_path) {
            Ok(_) => fs::remove_file(&operation.new_path).map_err(|e| {
                (
                    operation.new_path.clone(),
                    format!("Failed to remove link: {}", e),
                )
            }),
            Err(_) => Err((
                operation.new_path.clone(),
                "Link not found at expected location".to_string(),
            )),
        }
    }

    /// Example: `photo.jpg` becomes `photo.jpg.bak.20260830-143052`.
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");

        let backup_name = format!("{}.bak.{}", filename, timestamp);

        if let Some(parent) = original_path.parent() {
            parent.join(backup_name)
        } else {
            PathBuf::from(backup_name)
        }
    }
}
