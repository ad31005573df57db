//! The placement engine: materializes the grouping tree on disk.
//!
//! Driven as a visitor over the built tree, it resolves a destination path
//! for every real entry (nested or flattened), creates the destination
//! directory chain with the source root's permissions, and then moves,
//! hard-links, or symlinks the entry into place.
//!
//! Error handling splits two ways: a failed directory creation or required
//! directory symlink poisons the whole run (the destination hierarchy is no
//! longer trustworthy), while a failed move or copy of a single entry is
//! recorded and the traversal continues.

use crate::config::GroupingConfig;
use crate::dates::display_name;
use crate::history::{Operation, OperationKind};
use crate::node::{Node, NodeVisitor};
use crate::output::OutputFormatter;
use indicatif::ProgressBar;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors raised while placing entries.
#[derive(Debug)]
pub enum PlacementError {
    /// A destination directory could not be created. Fatal.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// A required directory symlink could not be created. Fatal, since a
    /// missing link would silently lose an entire subtree.
    SymlinkFailed {
        source_path: PathBuf,
        destination: PathBuf,
        source: io::Error,
    },
    /// The source root's permissions could not be read. Fatal.
    RootPermissions { path: PathBuf, source: io::Error },
    /// An entry could not be statted at visit time.
    EntryInaccessible { path: PathBuf, source: io::Error },
    /// An individual move/copy failed; the entry is skipped.
    EntryFailed {
        source_path: PathBuf,
        destination: PathBuf,
        source: io::Error,
    },
}

impl PlacementError {
    /// Fatal errors abort the run; the rest skip one entry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PlacementError::DirectoryCreationFailed { .. }
                | PlacementError::SymlinkFailed { .. }
                | PlacementError::RootPermissions { .. }
        )
    }
}

impl std::fmt::Display for PlacementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementError::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            PlacementError::SymlinkFailed {
                source_path,
                destination,
                source,
            } => {
                write!(
                    f,
                    "Failed to create symlink {} -> {}: {}",
                    destination.display(),
                    source_path.display(),
                    source
                )
            }
            PlacementError::RootPermissions { path, source } => {
                write!(
                    f,
                    "Cannot read permissions of {}: {}",
                    path.display(),
                    source
                )
            }
            PlacementError::EntryInaccessible { path, source } => {
                write!(f, "Cannot access {}: {}", path.display(), source)
            }
            PlacementError::EntryFailed {
                source_path,
                destination,
                source,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source_path.display(),
                    destination.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for PlacementError {}

/// Everything a placement walk produced.
#[derive(Debug)]
pub struct PlacementOutcome {
    /// Mutations performed, in traversal order.
    pub operations: Vec<Operation>,
    /// Per-entry failures; the corresponding entries were skipped.
    pub entry_errors: Vec<PlacementError>,
    /// Set if the run was aborted; entries after the failure point were
    /// not processed. Already performed operations are not rolled back.
    pub fatal: Option<PlacementError>,
}

/// Visitor that performs the filesystem mutation for each tree leaf.
pub struct PlacementEngine<'a> {
    config: &'a GroupingConfig,
    /// Permission bits of the source root, inherited by every created
    /// destination directory (Unix only).
    root_mode: Option<u32>,
    /// Resolved path segments, indexed by depth - 1.
    segments: Vec<String>,
    operations: Vec<Operation>,
    entry_errors: Vec<PlacementError>,
    fatal: Option<PlacementError>,
    progress: Option<ProgressBar>,
}

impl<'a> PlacementEngine<'a> {
    /// # Errors
    ///
    /// Returns an error if the source root cannot be statted for its
    /// permission bits.
    pub fn new(config: &'a GroupingConfig) -> Result<Self, PlacementError> {
        let metadata =
            fs::metadata(&config.source_dir).map_err(|e| PlacementError::RootPermissions {
                path: config.source_dir.clone(),
                source: e,
            })?;

        #[cfg(unix)]
        let root_mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(metadata.permissions().mode() & 0o777)
        };
        #[cfg(not(unix))]
        let root_mode = {
            let _ = metadata;
            None
        };

        Ok(Self {
            config,
            root_mode,
            segments: Vec::new(),
            operations: Vec::new(),
            entry_errors: Vec::new(),
            fatal: None,
            progress: None,
        })
    }

    /// Attaches a progress bar ticked once per processed entry.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Finishes the walk, yielding operations and errors.
    pub fn finish(self) -> PlacementOutcome {
        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }
        PlacementOutcome {
            operations: self.operations,
            entry_errors: self.entry_errors,
            fatal: self.fatal,
        }
    }

    fn place(
        &self,
        node: &Node,
        source: &Path,
        metadata: &fs::Metadata,
    ) -> Result<Option<Operation>, PlacementError> {
        let grouping_len = self.segments.len() - 1;
        let (destination_dir, destination) = if self.config.flatten {
            let flattened = self.segments[..grouping_len].join("-");
            let dir = self.config.output_dir.join(flattened);
            let destination = dir.join(&node.name);
            (dir, destination)
        } else {
            let mut dir = self.config.output_dir.clone();
            for segment in &self.segments[..grouping_len] {
                dir.push(segment);
            }
            let destination = dir.join(&self.segments[grouping_len]);
            (dir, destination)
        };

        self.create_destination_dir(&destination_dir)?;

        if self.config.copy_only && metadata.is_dir() {
            return self.symlink_directory(source, &destination);
        }
        self.move_or_copy(source, &destination, metadata)
    }

    /// Creates the destination directory chain recursively, carrying the
    /// source root's permission bits so the generated hierarchy does not
    /// depend on the umask.
    fn create_destination_dir(&self, dir: &Path) -> Result<(), PlacementError> {
        #[cfg(unix)]
        let result = {
            use std::os::unix::fs::DirBuilderExt;
            match self.root_mode {
                Some(mode) => fs::DirBuilder::new().recursive(true).mode(mode).create(dir),
                None => fs::create_dir_all(dir),
            }
        };
        #[cfg(not(unix))]
        let result = fs::create_dir_all(dir);

        result.map_err(|e| PlacementError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: e,
        })
    }

    /// Directories are never physically copied; a symlink to the absolute
    /// source path stands in for the whole subtree.
    fn symlink_directory(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<Option<Operation>, PlacementError> {
        let target =
            std::path::absolute(source).map_err(|e| PlacementError::SymlinkFailed {
                source_path: source.to_path_buf(),
                destination: destination.to_path_buf(),
                source: e,
            })?;

        // A link from a previous run is a no-op, not a conflict.
        if let Ok(existing) = fs::read_link(destination)
            && existing == target
        {
            return Ok(None);
        }

        if self.config.verbose {
            OutputFormatter::info(&format!(
                "Linking {} -> {}",
                destination.display(),
                target.display()
            ));
        }

        make_symlink(&target, destination).map_err(|e| PlacementError::SymlinkFailed {
            source_path: target.clone(),
            destination: destination.to_path_buf(),
            source: e,
        })?;

        Ok(Some(Operation {
            original_path: target,
            new_path: destination.to_path_buf(),
            kind: OperationKind::Symlinked,
        }))
    }

    /// Moves or hard-links one entry into place.
    ///
    /// If source and destination already refer to the same underlying
    /// file the call is a silent no-op, which makes re-runs over a
    /// previously grouped tree safe.
    fn move_or_copy(
        &self,
        source: &Path,
        destination: &Path,
        metadata: &fs::Metadata,
    ) -> Result<Option<Operation>, PlacementError> {
        if self.config.ignore_directories && metadata.is_dir() {
            return Ok(None);
        }

        match fs::metadata(destination) {
            Ok(dest_metadata) => {
                if same_entry(source, destination, metadata, &dest_metadata) {
                    return Ok(None);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(entry_failed(source, destination, e)),
        }

        if self.config.verbose {
            OutputFormatter::info(&format!(
                "Moving {} -> {}",
                source.display(),
                destination.display()
            ));
        }

        if self.config.copy_only {
            // Same-filesystem design point: a hard link, not a content copy.
            fs::hard_link(source, destination)
                .map_err(|e| entry_failed(source, destination, e))?;
            return Ok(Some(operation(
                source,
                destination,
                OperationKind::HardLinked,
            )));
        }

        match fs::rename(source, destination) {
            Ok(()) => Ok(Some(operation(source, destination, OperationKind::Moved))),
            Err(_) => {
                // Cross-device rename. Hard-link instead; the source is
                // intentionally left in place.
                fs::hard_link(source, destination)
                    .map_err(|e| entry_failed(source, destination, e))?;
                Ok(Some(operation(
                    source,
                    destination,
                    OperationKind::HardLinked,
                )))
            }
        }
    }
}

impl NodeVisitor for PlacementEngine<'_> {
    fn visit(&mut self, node: &Node, depth: usize, _is_last: bool) {
        if self.fatal.is_some() {
            return;
        }
        if depth == 0 {
            self.segments.clear();
            return;
        }

        // Truncating first drops any stale segments left behind by a
        // deeper subtree visited earlier in the walk.
        self.segments.truncate(depth - 1);
        let expand = self.config.expands_month_names();
        self.segments
            .push(display_name(&node.name, depth, expand));

        // In flatten mode branch nodes contribute only their segment; the
        // joined path is materialized at their leaves.
        if self.config.flatten && node.has_children() {
            return;
        }

        let source = self.config.source_dir.join(&node.name);
        let metadata = match fs::metadata(&source) {
            Ok(metadata) => metadata,
            // Synthetic grouping nodes have no backing entry.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                self.entry_errors.push(PlacementError::EntryInaccessible {
                    path: source,
                    source: e,
                });
                return;
            }
        };

        match self.place(node, &source, &metadata) {
            Ok(Some(operation)) => self.operations.push(operation),
            Ok(None) => {}
            Err(error) if error.is_fatal() => {
                self.fatal = Some(error);
                return;
            }
            Err(error) => self.entry_errors.push(error),
        }

        if let Some(progress) = &self.progress {
            progress.inc(1);
        }
    }
}

fn operation(source: &Path, destination: &Path, kind: OperationKind) -> Operation {
    Operation {
        original_path: source.to_path_buf(),
        new_path: destination.to_path_buf(),
        kind,
    }
}

fn entry_failed(source: &Path, destination: &Path, error: io::Error) -> PlacementError {
    PlacementError::EntryFailed {
        source_path: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source: error,
    }
}

/// Whether two paths refer to the identical underlying file.
fn same_entry(
    source: &Path,
    destination: &Path,
    source_metadata: &fs::Metadata,
    destination_metadata: &fs::Metadata,
) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let _ = (source, destination);
        return source_metadata.dev() == destination_metadata.dev()
            && source_metadata.ino() == destination_metadata.ino();
    }
    #[cfg(not(unix))]
    {
        let _ = (source_metadata, destination_metadata);
        match (fs::canonicalize(source), fs::canonicalize(destination)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(unix)]
fn make_symlink(target: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, destination)
}

#[cfg(windows)]
fn make_symlink(target: &Path, destination: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, destination)
}

#[cfg(not(any(unix, windows)))]
fn make_symlink(_target: &Path, _destination: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}
