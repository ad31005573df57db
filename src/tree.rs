//! Builds the grouping tree from a flat directory listing.
//!
//! The tree is populated once from the scanned directory's immediate
//! entries and never mutated afterwards. Each entry is attached under a
//! chain of synthetic year/month/day nodes, created on demand so that
//! every distinct grouping key exists exactly once per level.

use crate::config::GroupingConfig;
use crate::dates::{GroupDate, TimestampSource};
use crate::node::{Node, NodeVisitor};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while building the tree. None of these leave a
/// partial tree in use: the whole build is abandoned.
#[derive(Debug)]
pub enum BuildError {
    /// The scanned directory could not be opened or listed.
    DirectoryUnreadable { path: PathBuf, source: io::Error },
    /// The scanned directory has no entries at all.
    EmptyDirectory(PathBuf),
    /// An entry's metadata could not be read.
    EntryMetadata { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::DirectoryUnreadable { path, source } => {
                write!(f, "Cannot read directory {}: {}", path.display(), source)
            }
            BuildError::EmptyDirectory(path) => {
                write!(f, "Directory {} is empty", path.display())
            }
            BuildError::EntryMetadata { path, source } => {
                write!(f, "Cannot stat {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// The grouping index over one scanned directory.
///
/// The root node represents the directory itself; depth 1 holds year
/// nodes, depth 2 months (when grouping that deep), depth 3 days. Leaves
/// are the real entries.
pub struct Tree {
    root: Node,
    max_depth: usize,
    directory_count: usize,
    file_count: usize,
}

impl Tree {
    /// Creates an empty tree rooted at `directory`.
    ///
    /// The root node is named with the absolute path and dated from the
    /// directory's own timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be resolved or statted.
    pub fn new(
        directory: &Path,
        max_depth: usize,
        timestamp: TimestampSource,
    ) -> Result<Self, BuildError> {
        let absolute = std::path::absolute(directory).map_err(|e| {
            BuildError::DirectoryUnreadable {
                path: directory.to_path_buf(),
                source: e,
            }
        })?;
        let metadata = fs::metadata(&absolute).map_err(|e| BuildError::DirectoryUnreadable {
            path: absolute.clone(),
            source: e,
        })?;
        let date = GroupDate::from_metadata(&metadata, timestamp).map_err(|e| {
            BuildError::EntryMetadata {
                path: absolute.clone(),
                source: e,
            }
        })?;

        Ok(Self {
            root: Node::new(absolute.to_string_lossy().into_owned(), date),
            max_depth,
            directory_count: 0,
            file_count: 0,
        })
    }

    /// Reads the directory's immediate entries (no recursion) and inserts
    /// each one that passes the configured filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed, is empty, or an
    /// entry cannot be statted.
    pub fn build(&mut self, config: &GroupingConfig) -> Result<(), BuildError> {
        let root_path = PathBuf::from(&self.root.name);
        let entries = fs::read_dir(&root_path).map_err(|e| BuildError::DirectoryUnreadable {
            path: root_path.clone(),
            source: e,
        })?;

        let mut seen_any = false;
        for entry in entries {
            let entry = entry.map_err(|e| BuildError::DirectoryUnreadable {
                path: root_path.clone(),
                source: e,
            })?;
            seen_any = true;

            let name = entry.file_name().to_string_lossy().into_owned();
            if !config.should_include(&name) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| BuildError::EntryMetadata {
                path: entry.path(),
                source: e,
            })?;
            if config.ignore_directories && metadata.is_dir() {
                continue;
            }

            let date = GroupDate::from_metadata(&metadata, config.timestamp).map_err(|e| {
                BuildError::EntryMetadata {
                    path: entry.path(),
                    source: e,
                }
            })?;
            self.add_entry(&name, metadata.is_dir(), date);
        }

        if !seen_any {
            return Err(BuildError::EmptyDirectory(root_path));
        }
        Ok(())
    }

    /// Inserts one entry under its year (and month/day, depending on the
    /// configured depth) grouping chain. Synthetic nodes are created on
    /// demand, at most one per distinct key per level, so inserting many
    /// entries sharing a date is idempotent with respect to tree shape.
    pub fn add_entry(&mut self, name: &str, is_dir: bool, date: GroupDate) {
        if is_dir {
            self.directory_count += 1;
        } else {
            self.file_count += 1;
        }

        let leaf = Node::new(name, date);
        let year_key = date.year.to_string();
        let month_key = date.month.to_string();
        let day_key = date.day.to_string();

        let year_node = self.root.child_or_insert(&year_key, date);
        match self.max_depth {
            1 => year_node.add_child(leaf),
            2 => year_node.child_or_insert(&month_key, date).add_child(leaf),
            _ => year_node
                .child_or_insert(&month_key, date)
                .child_or_insert(&day_key, date)
                .add_child(leaf),
        }
    }

    /// Walks the whole tree depth-first, starting at depth 0 for the
    /// scanned directory itself.
    pub fn visit(&self, visitor: &mut dyn NodeVisitor) {
        self.root.visit(visitor, 0, true);
    }

    /// The root node (the scanned directory).
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of directory entries inserted.
    pub fn directories(&self) -> usize {
        self.directory_count
    }

    /// Number of file entries inserted.
    pub fn files(&self) -> usize {
        self.file_count
    }
}
