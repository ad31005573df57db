//! datetidy - group directory entries by date
//!
//! This library scans a directory, classifies each entry by its modification
//! or creation timestamp, and reorganizes the entries into a year/month/day
//! hierarchy by moving, hard-linking, or symlinking them. Runs are recorded
//! in a history file so they can be undone.

pub mod cli;
pub mod config;
pub mod dates;
pub mod history;
pub mod node;
pub mod output;
pub mod placement;
pub mod printer;
pub mod tree;
pub mod undo;

pub use config::{ConfigError, Depth, FileConfig, GroupingConfig, GroupingSettings};
pub use dates::{GroupDate, TimestampSource};
pub use history::{Operation, OperationKind, OperationLog};
pub use node::{MultiVisitor, Node, NodeVisitor};
pub use placement::{PlacementEngine, PlacementError, PlacementOutcome};
pub use printer::PrintingVisitor;
pub use tree::{BuildError, Tree};
pub use undo::{UndoManager, UndoReport};

pub use cli::{AppError, Cli, run};
