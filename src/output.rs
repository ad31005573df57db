//! Terminal output styling.
//!
//! Centralizes colored messages and the progress bar so formatting stays
//! consistent across the CLI.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Consistent styling for all CLI output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Green success message with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Red error message with an X mark, on stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Yellow warning message.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Cyan info message.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Unstyled message.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints the directory/file totals shown after a dry run.
    pub fn counts(directories: usize, files: usize) {
        println!(
            "\n{} directories, {} files",
            directories.to_string().bold(),
            files.to_string().bold()
        );
    }

    /// A progress bar sized for the placement walk.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Yellow dry-run banner.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
