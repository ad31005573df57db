//! Run configuration: defaults file, CLI-merged settings, and the compiled
//! immutable configuration the tree and placement engine consume.
//!
//! Defaults can be supplied in a TOML file and are overridden by CLI flags:
//!
//! ```toml
//! [defaults]
//! depth = "month"          # year | month | day
//! timestamp = "modified"   # modified | created
//! flatten = false
//! expand_month = true
//!
//! [filters]
//! include_hidden = false
//! pattern = "\\.jpe?g$"
//! exclude = ["*.tmp", "*.part"]
//! ```

use crate::dates::TimestampSource;
use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// The name filter is not a valid regular expression.
    InvalidPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// Why it is invalid.
        reason: String,
    },
    /// An exclude rule is not a valid glob.
    InvalidGlobPattern(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid regular expression '{}': {}", pattern, reason)
            }
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid exclude glob '{}'", pattern)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// How many grouping levels the tree carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    /// Year only.
    Year,
    /// Year, then month.
    Month,
    /// Year, month, then day.
    Day,
}

impl Depth {
    /// The number of synthetic levels between the root and the leaves.
    pub fn levels(&self) -> usize {
        match self {
            Depth::Year => 1,
            Depth::Month => 2,
            Depth::Day => 3,
        }
    }
}

impl Default for Depth {
    fn default() -> Self {
        Depth::Year
    }
}

/// Configuration file contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub defaults: DefaultRules,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Grouping defaults a CLI flag can override.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultRules {
    #[serde(default)]
    pub depth: Depth,
    #[serde(default)]
    pub timestamp: TimestampSource,
    #[serde(default)]
    pub flatten: bool,
    /// Render month directories with English names. Defaults to true.
    #[serde(default = "default_expand_month")]
    pub expand_month: bool,
}

fn default_expand_month() -> bool {
    true
}

impl Default for DefaultRules {
    fn default() -> Self {
        Self {
            depth: Depth::default(),
            timestamp: TimestampSource::default(),
            flatten: false,
            expand_month: true,
        }
    }
}

/// Entry filtering rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterRules {
    /// Whether to group hidden entries (names starting with "."). Defaults
    /// to false.
    #[serde(default)]
    pub include_hidden: bool,

    /// Only group entries whose name matches this regular expression.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Glob patterns for entries to skip (e.g. "*.tmp").
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl FileConfig {
    /// Load configuration with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. An explicitly provided path (missing file is an error)
    /// 2. `.datetidyrc.toml` in the current directory
    /// 3. `~/.config/datetidy/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".datetidyrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("datetidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// The merged, not-yet-compiled run settings (file defaults + CLI flags).
#[derive(Debug, Clone)]
pub struct GroupingSettings {
    pub source_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub depth: Depth,
    pub timestamp: TimestampSource,
    pub flatten: bool,
    pub copy_only: bool,
    pub ignore_directories: bool,
    pub include_hidden: bool,
    pub expand_month: bool,
    pub verbose: bool,
    pub pattern: Option<String>,
    pub excludes: Vec<String>,
}

impl GroupingSettings {
    /// Settings for a plain `datetidy <dir>` run.
    pub fn new(source_dir: PathBuf) -> Self {
        Self {
            source_dir,
            output_dir: None,
            depth: Depth::default(),
            timestamp: TimestampSource::default(),
            flatten: false,
            copy_only: false,
            ignore_directories: false,
            include_hidden: false,
            expand_month: true,
            verbose: false,
            pattern: None,
            excludes: Vec::new(),
        }
    }

    /// Compiles the pattern filter and exclude globs into an immutable
    /// [`GroupingConfig`]. This runs before the tree is built, so a bad
    /// pattern fails the run before any insertion happens.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern or any exclude glob is invalid.
    pub fn compile(self) -> Result<GroupingConfig, ConfigError> {
        let pattern = match self.pattern {
            Some(pattern) => Some(Regex::new(&pattern).map_err(|e| {
                ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        let excludes = self
            .excludes
            .iter()
            .map(|glob| {
                Pattern::new(glob).map_err(|_| ConfigError::InvalidGlobPattern(glob.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output_dir = self.output_dir.unwrap_or_else(|| self.source_dir.clone());

        Ok(GroupingConfig {
            source_dir: self.source_dir,
            output_dir,
            depth: self.depth,
            timestamp: self.timestamp,
            flatten: self.flatten,
            copy_only: self.copy_only,
            ignore_directories: self.ignore_directories,
            include_hidden: self.include_hidden,
            expand_month: self.expand_month,
            verbose: self.verbose,
            pattern,
            excludes,
        })
    }
}

/// The immutable run configuration. Constructed once, read-only thereafter.
#[derive(Debug)]
pub struct GroupingConfig {
    pub source_dir: PathBuf,
    /// Destination root; equals `source_dir` unless overridden.
    pub output_dir: PathBuf,
    pub depth: Depth,
    pub timestamp: TimestampSource,
    pub flatten: bool,
    pub copy_only: bool,
    pub ignore_directories: bool,
    pub include_hidden: bool,
    pub expand_month: bool,
    pub verbose: bool,
    pattern: Option<Regex>,
    excludes: Vec<Pattern>,
}

impl GroupingConfig {
    /// Whether month names are rendered at the month level. Expansion only
    /// applies when the grouping actually has a month level, so a depth-2
    /// leaf under year grouping keeps its literal name.
    pub fn expands_month_names(&self) -> bool {
        self.expand_month && self.depth.levels() >= 2
    }

    /// Whether an entry name passes the hidden-file policy, the pattern
    /// filter, and the exclude globs.
    pub fn should_include(&self, name: &str) -> bool {
        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        if let Some(ref pattern) = self.pattern
            && !pattern.is_match(name)
        {
            return false;
        }

        !self.excludes.iter().any(|glob| glob.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GroupingSettings {
        GroupingSettings::new(PathBuf::from("/tmp/source"))
    }

    #[test]
    fn test_default_depth_is_year() {
        assert_eq!(Depth::default(), Depth::Year);
        assert_eq!(Depth::Year.levels(), 1);
        assert_eq!(Depth::Month.levels(), 2);
        assert_eq!(Depth::Day.levels(), 3);
    }

    #[test]
    fn test_output_dir_defaults_to_source() {
        let config = settings().compile().unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/source"));
    }

    #[test]
    fn test_month_expansion_requires_a_month_level() {
        // Year-only grouping has no month level to rename, so the flag is
        // off even when expansion is requested.
        let config = settings().compile().unwrap();
        assert_eq!(config.depth, Depth::Year);
        assert!(config.expand_month);
        assert!(!config.expands_month_names());

        let mut monthly = settings();
        monthly.depth = Depth::Month;
        let config = monthly.compile().unwrap();
        assert!(config.expands_month_names());

        let mut numeric = settings();
        numeric.depth = Depth::Day;
        numeric.expand_month = false;
        let config = numeric.compile().unwrap();
        assert!(!config.expands_month_names());
    }

    #[test]
    fn test_hidden_entries_excluded_by_default() {
        let config = settings().compile().unwrap();
        assert!(!config.should_include(".secret"));
        assert!(config.should_include("notes.txt"));
    }

    #[test]
    fn test_hidden_entries_included_when_enabled() {
        let mut settings = settings();
        settings.include_hidden = true;
        let config = settings.compile().unwrap();
        assert!(config.should_include(".secret"));
    }

    #[test]
    fn test_pattern_filter() {
        let mut settings = settings();
        settings.pattern = Some(r"\.txt$".to_string());
        let config = settings.compile().unwrap();

        assert!(config.should_include("notes.txt"));
        assert!(!config.should_include("notes.md"));
    }

    #[test]
    fn test_invalid_pattern_returns_error() {
        let mut settings = settings();
        settings.pattern = Some("[invalid(".to_string());
        let result = settings.compile();
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_exclude_globs() {
        let mut settings = settings();
        settings.excludes = vec!["*.tmp".to_string(), "Thumbs.db".to_string()];
        let config = settings.compile().unwrap();

        assert!(!config.should_include("scratch.tmp"));
        assert!(!config.should_include("Thumbs.db"));
        assert!(config.should_include("photo.jpg"));
    }

    #[test]
    fn test_invalid_exclude_glob_returns_error() {
        let mut settings = settings();
        settings.excludes = vec!["[invalid".to_string()];
        let result = settings.compile();
        assert!(matches!(result, Err(ConfigError::InvalidGlobPattern(_))));
    }

    #[test]
    fn test_file_config_parses_all_sections() {
        let toml = r#"
            [defaults]
            depth = "day"
            timestamp = "created"
            flatten = true
            expand_month = false

            [filters]
            include_hidden = true
            pattern = "\\.jpg$"
            exclude = ["*.tmp"]
        "#;
        let config: FileConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.defaults.depth, Depth::Day);
        assert_eq!(config.defaults.timestamp, TimestampSource::Created);
        assert!(config.defaults.flatten);
        assert!(!config.defaults.expand_month);
        assert!(config.filters.include_hidden);
        assert_eq!(config.filters.pattern.as_deref(), Some(r"\.jpg$"));
        assert_eq!(config.filters.exclude, vec!["*.tmp".to_string()]);
    }

    #[test]
    fn test_file_config_defaults_when_empty() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.defaults.depth, Depth::Year);
        assert!(config.defaults.expand_month);
        assert!(!config.filters.include_hidden);
        assert!(config.filters.pattern.is_none());
    }

    #[test]
    fn test_load_missing_explicit_file_is_an_error() {
        let result = FileConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}
