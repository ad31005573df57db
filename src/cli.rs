//! Command-line interface for datetidy.
//!
//! Parses the argument surface, merges it with the optional configuration
//! file, and orchestrates the run: build the grouping tree, then either
//! print it (dry run), place entries on disk, or undo the previous run.

use crate::config::{ConfigError, Depth, FileConfig, GroupingSettings};
use crate::dates::TimestampSource;
use crate::history::{HistoryError, OperationLog};
use crate::node::MultiVisitor;
use crate::output::OutputFormatter;
use crate::placement::{PlacementEngine, PlacementError};
use crate::printer::PrintingVisitor;
use crate::tree::{BuildError, Tree};
use crate::undo::UndoManager;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Group files and directories by the date they were created or modified.
#[derive(Parser, Debug)]
#[command(name = "datetidy", version)]
pub struct Cli {
    /// Directory containing the entries to group
    pub directory: PathBuf,

    /// Directory to place grouped entries under (defaults to the source directory)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Group by year only
    #[arg(long, conflicts_with_all = ["month", "day"])]
    pub year: bool,

    /// Group by year, then month
    #[arg(long, conflicts_with = "day")]
    pub month: bool,

    /// Group by year, month, then day
    #[arg(long)]
    pub day: bool,

    /// Join the date segments into a single directory name (e.g. 2016-January)
    #[arg(long)]
    pub flatten: bool,

    /// Hard-link files and symlink directories instead of moving them
    #[arg(long = "copy-only")]
    pub copy_only: bool,

    /// Skip directory entries entirely
    #[arg(long = "ignore-directories")]
    pub ignore_directories: bool,

    /// Group by the date entries were created
    #[arg(long, conflicts_with = "modified")]
    pub created: bool,

    /// Group by the date entries were modified (the default)
    #[arg(long)]
    pub modified: bool,

    /// Include hidden entries (names starting with '.')
    #[arg(short = 'a', long = "all")]
    pub include_hidden: bool,

    /// Only group entries whose name matches this regular expression
    #[arg(short = 'e', long = "pattern")]
    pub pattern: Option<String>,

    /// Skip entries matching this glob (repeatable)
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Keep numeric month directories instead of English month names
    #[arg(long = "no-expand-month")]
    pub no_expand_month: bool,

    /// Show how entries would be grouped without touching the filesystem
    #[arg(short = 'p', long = "dry-run", visible_alias = "preview")]
    pub dry_run: bool,

    /// Print the grouping tree while entries are placed
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Path to a configuration file
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Revert the most recent run recorded in the history file
    #[arg(long)]
    pub undo: bool,
}

/// Top-level error type; maps each failure class to its exit code.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Build(BuildError),
    Placement(PlacementError),
    History(HistoryError),
}

impl AppError {
    /// Config/build/history problems exit 1; a fatal placement error
    /// (untrustworthy destination hierarchy) exits 2.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Build(_) | AppError::History(_) => 1,
            AppError::Placement(_) => 2,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Build(e) => write!(f, "{}", e),
            AppError::Placement(e) => write!(f, "{}", e),
            AppError::History(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError::Config(error)
    }
}

impl From<BuildError> for AppError {
    fn from(error: BuildError) -> Self {
        AppError::Build(error)
    }
}

impl From<HistoryError> for AppError {
    fn from(error: HistoryError) -> Self {
        AppError::History(error)
    }
}

impl From<PlacementError> for AppError {
    fn from(error: PlacementError) -> Self {
        AppError::Placement(error)
    }
}

/// Runs the CLI application.
///
/// # Errors
///
/// Returns an error for configuration, build, undo, or fatal placement
/// failures; per-entry placement failures are reported on stderr without
/// failing the run.
pub fn run(cli: &Cli) -> Result<(), AppError> {
    if cli.undo {
        return undo_run(&cli.directory);
    }

    let settings = build_settings(cli)?;
    let config = settings.compile()?;

    let mut tree = Tree::new(&config.source_dir, config.depth.levels(), config.timestamp)?;
    tree.build(&config)?;

    if cli.dry_run {
        OutputFormatter::dry_run_notice("No entries will be modified.");
        let mut printer = PrintingVisitor::stdout(config.expands_month_names());
        tree.visit(&mut printer);
        OutputFormatter::counts(tree.directories(), tree.files());
        return Ok(());
    }

    let mut engine = PlacementEngine::new(&config)?;
    if config.verbose {
        // One walk, observed by both visitors node-by-node.
        let mut printer = PrintingVisitor::stdout(config.expands_month_names());
        let mut multi = MultiVisitor::new(vec![&mut printer, &mut engine]);
        tree.visit(&mut multi);
    } else {
        let total = (tree.directories() + tree.files()) as u64;
        engine = engine.with_progress(OutputFormatter::create_progress_bar(total));
        tree.visit(&mut engine);
    }

    let outcome = engine.finish();
    for error in &outcome.entry_errors {
        OutputFormatter::error(&error.to_string());
    }

    // Record what actually happened, even when the run aborted partway:
    // completed operations are not rolled back and must stay undoable.
    if !outcome.operations.is_empty() {
        let mut log = OperationLog::new(config.source_dir.clone());
        for operation in outcome.operations {
            log.add_operation(operation);
        }
        match log.save(&config.source_dir) {
            Ok(()) => OutputFormatter::plain(&format!(
                "Grouped {} entries. Use 'datetidy {} --undo' to revert.",
                log.operations.len(),
                config.source_dir.display()
            )),
            Err(e) => OutputFormatter::warning(&format!("Could not save history: {}", e)),
        }
    }

    if let Some(fatal) = outcome.fatal {
        return Err(AppError::Placement(fatal));
    }

    if !outcome.entry_errors.is_empty() {
        OutputFormatter::warning("Some entries could not be grouped. Review errors above.");
    }

    Ok(())
}

/// Merges file-config defaults with CLI flags; flags win.
fn build_settings(cli: &Cli) -> Result<GroupingSettings, AppError> {
    let file = FileConfig::load(cli.config.as_deref())?;

    let mut settings = GroupingSettings::new(cli.directory.clone());
    settings.output_dir = cli.output.clone();
    settings.depth = if cli.day {
        Depth::Day
    } else if cli.month {
        Depth::Month
    } else if cli.year {
        Depth::Year
    } else {
        file.defaults.depth
    };
    settings.timestamp = if cli.created {
        TimestampSource::Created
    } else if cli.modified {
        TimestampSource::Modified
    } else {
        file.defaults.timestamp
    };
    settings.flatten = cli.flatten || file.defaults.flatten;
    settings.expand_month = file.defaults.expand_month && !cli.no_expand_month;
    settings.copy_only = cli.copy_only;
    settings.ignore_directories = cli.ignore_directories;
    settings.include_hidden = cli.include_hidden || file.filters.include_hidden;
    settings.verbose = cli.verbose;
    settings.pattern = cli.pattern.clone().or(file.filters.pattern);
    settings.excludes = file
        .filters
        .exclude
        .into_iter()
        .chain(cli.exclude.iter().cloned())
        .collect();

    Ok(settings)
}

/// Reverts the previous run and reports what happened.
fn undo_run(base_path: &Path) -> Result<(), AppError> {
    OutputFormatter::plain("Undoing previous grouping...");

    let report = UndoManager::undo(base_path)?;

    OutputFormatter::success(&format!(
        "Restored {} entries, removed {} links.",
        report.restored_files, report.removed_links
    ));

    if !report.skipped_files.is_empty() {
        OutputFormatter::warning(&format!("Skipped: {}", report.skipped_files.len()));
        for (path, reason) in &report.skipped_files {
            OutputFormatter::plain(&format!("  - {}: {}", path.display(), reason));
        }
    }

    if !report.failed_restores.is_empty() {
        OutputFormatter::error(&format!("Failed: {}", report.failed_restores.len()));
        for (path, reason) in &report.failed_restores {
            OutputFormatter::error(&format!("  - {}: {}", path.display(), reason));
        }
        OutputFormatter::warning("History file was NOT deleted; fix the issues and retry.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("Arguments should parse")
    }

    #[test]
    fn test_minimal_invocation() {
        let cli = parse(&["datetidy", "/photos"]);
        assert_eq!(cli.directory, PathBuf::from("/photos"));
        assert!(!cli.dry_run);
        assert!(!cli.undo);
    }

    #[test]
    fn test_depth_flags_select_deepest() {
        let cli = parse(&["datetidy", "/photos", "--day"]);
        let settings = build_settings(&cli).unwrap();
        assert_eq!(settings.depth, Depth::Day);
    }

    #[test]
    fn test_conflicting_depth_flags_rejected() {
        let result = Cli::try_parse_from(["datetidy", "/photos", "--year", "--day"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_depth_defaults_to_year() {
        let cli = parse(&["datetidy", "/photos"]);
        let settings = build_settings(&cli).unwrap();
        assert_eq!(settings.depth, Depth::Year);
    }

    #[test]
    fn test_preview_alias() {
        let cli = parse(&["datetidy", "/photos", "--preview"]);
        assert!(cli.dry_run);
    }

    #[test]
    fn test_expand_month_on_by_default() {
        let cli = parse(&["datetidy", "/photos"]);
        let settings = build_settings(&cli).unwrap();
        assert!(settings.expand_month);

        let cli = parse(&["datetidy", "/photos", "--no-expand-month"]);
        let settings = build_settings(&cli).unwrap();
        assert!(!settings.expand_month);
    }

    #[test]
    fn test_created_flag_selects_timestamp_source() {
        let cli = parse(&["datetidy", "/photos", "--created"]);
        let settings = build_settings(&cli).unwrap();
        assert_eq!(settings.timestamp, TimestampSource::Created);
    }

    #[test]
    fn test_pattern_and_excludes_collected() {
        let cli = parse(&[
            "datetidy",
            "/photos",
            "-e",
            r"\.jpg$",
            "--exclude",
            "*.tmp",
            "--exclude",
            "*.part",
        ]);
        let settings = build_settings(&cli).unwrap();
        assert_eq!(settings.pattern.as_deref(), Some(r"\.jpg$"));
        assert_eq!(settings.excludes, vec!["*.tmp", "*.part"]);
    }

    #[test]
    fn test_exit_codes_by_error_class() {
        let config_error = AppError::Config(ConfigError::InvalidGlobPattern("[".to_string()));
        assert_eq!(config_error.exit_code(), 1);

        let placement_error = AppError::Placement(PlacementError::DirectoryCreationFailed {
            path: PathBuf::from("/out/2016"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });
        assert_eq!(placement_error.exit_code(), 2);
    }
}
