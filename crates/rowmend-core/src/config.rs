//! Run configuration
//!
//! Layered lowest to highest: defaults, `rowmend.toml` (or an explicit
//! `--config` file), `ROWMEND_SNAPSHOT_DIR`, then command-line flags.

use rowmend_enhance::{CoveragePolicy, EnhanceOptions, ParagraphSeparator, RangeSelector, DEFAULT_TARGET_COLUMN};
use rowmend_record::KeySelection;
use rowmend_recovery::FileSnapshotStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "rowmend.toml";

/// Environment variable overriding the snapshot directory
pub const SNAPSHOT_DIR_ENV: &str = "ROWMEND_SNAPSHOT_DIR";

/// Settings for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Column enhanced when an enhancement names none
    pub target_column: String,
    /// Key column names; empty means the first two columns
    pub key_columns: Vec<String>,
    /// Paragraph break between existing and appended text
    pub separator: ParagraphSeparator,
    /// What to do with selected records lacking an enhancement
    pub coverage: CoveragePolicy,
    /// Snapshot store directory; defaults to `<output>.rowmend/`
    pub snapshot_dir: Option<PathBuf>,
    /// Rows that must already be enhanced; with no history this is fatal
    pub expect_enhanced: Option<RangeSelector>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            key_columns: Vec::new(),
            separator: ParagraphSeparator::default(),
            coverage: CoveragePolicy::default(),
            snapshot_dir: None,
            expect_enhanced: None,
        }
    }
}

impl RunConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With target column
    #[inline]
    #[must_use]
    pub fn with_target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = column.into();
        self
    }

    /// With named key columns
    #[inline]
    #[must_use]
    pub fn with_key_columns(mut self, columns: Vec<String>) -> Self {
        self.key_columns = columns;
        self
    }

    /// With paragraph separator
    #[inline]
    #[must_use]
    pub fn with_separator(mut self, separator: ParagraphSeparator) -> Self {
        self.separator = separator;
        self
    }

    /// With coverage policy
    #[inline]
    #[must_use]
    pub fn with_coverage(mut self, coverage: CoveragePolicy) -> Self {
        self.coverage = coverage;
        self
    }

    /// With snapshot directory
    #[inline]
    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// With rows expected to be enhanced already
    #[inline]
    #[must_use]
    pub fn with_expect_enhanced(mut self, selector: RangeSelector) -> Self {
        self.expect_enhanced = Some(selector);
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// [`ConfigError::Parse`] for invalid TOML or unknown keys.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    /// Load a config file
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not a valid config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text, path)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load `explicit` if given, else `dir/rowmend.toml` if present, else defaults
    ///
    /// # Errors
    /// See [`RunConfig::load`]; a missing default file is not an error.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides read through `lookup`
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(SNAPSHOT_DIR_ENV).filter(|d| !d.is_empty()) {
            self.snapshot_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_env(|name| std::env::var(name).ok())
    }

    /// Key column selection for the loader
    #[must_use]
    pub fn key_selection(&self) -> KeySelection {
        if self.key_columns.is_empty() {
            KeySelection::Leading
        } else {
            KeySelection::Named(self.key_columns.clone())
        }
    }

    /// Options for the enhancer
    #[must_use]
    pub fn enhance_options(&self) -> EnhanceOptions {
        EnhanceOptions::new()
            .with_default_column(self.target_column.clone())
            .with_separator(self.separator)
            .with_coverage(self.coverage)
    }

    /// Snapshot store for a working copy at `output`
    #[must_use]
    pub fn snapshot_store(&self, output: &Path) -> FileSnapshotStore {
        let store = match &self.snapshot_dir {
            Some(dir) => FileSnapshotStore::new(dir),
            None => FileSnapshotStore::for_input(output),
        };
        store.with_separator(self.separator)
    }
}

/// Configuration could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid config
    #[error("invalid config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = RunConfig::new();
        assert_eq!(config.target_column, "Description");
        assert_eq!(config.key_selection(), KeySelection::Leading);
        assert_eq!(config.coverage, CoveragePolicy::Lenient);
        assert_eq!(config.separator, ParagraphSeparator::Newlines);
    }

    #[test]
    fn parses_full_file() {
        let config = RunConfig::from_toml_str(
            r#"
target_column = "Notes"
key_columns = ["Parent", "Child"]
separator = "escaped"
coverage = "strict"
snapshot_dir = "/var/lib/rowmend"
expect_enhanced = "1..100"
"#,
            Path::new("rowmend.toml"),
        )
        .unwrap();
        assert_eq!(
            config,
            RunConfig::new()
                .with_target_column("Notes")
                .with_key_columns(vec!["Parent".into(), "Child".into()])
                .with_separator(ParagraphSeparator::Escaped)
                .with_coverage(CoveragePolicy::Strict)
                .with_snapshot_dir("/var/lib/rowmend")
                .with_expect_enhanced(RangeSelector::new(1, 100).unwrap())
        );
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = RunConfig::from_toml_str("coverage = \"strict\"\n", Path::new("x.toml")).unwrap();
        assert_eq!(config.target_column, "Description");
        assert_eq!(config.coverage, CoveragePolicy::Strict);
    }

    #[test]
    fn unknown_keys_and_bad_ranges_rejected() {
        assert!(RunConfig::from_toml_str("colour = 1\n", Path::new("x.toml")).is_err());
        assert!(RunConfig::from_toml_str("expect_enhanced = \"9..2\"\n", Path::new("x.toml")).is_err());
    }

    #[test]
    fn env_overrides_snapshot_dir() {
        let config = RunConfig::new()
            .with_snapshot_dir("/from/file")
            .with_env(|name| (name == SNAPSHOT_DIR_ENV).then(|| "/from/env".to_string()));
        assert_eq!(config.snapshot_dir, Some(PathBuf::from("/from/env")));

        let untouched = RunConfig::new().with_env(|_| None);
        assert_eq!(untouched.snapshot_dir, None);
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(RunConfig::discover(None, dir.path()).unwrap(), RunConfig::new());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "target_column = \"Notes\"\n").unwrap();
        assert_eq!(RunConfig::discover(None, dir.path()).unwrap().target_column, "Notes");
    }

    #[test]
    fn store_defaults_to_sidecar() {
        let store = RunConfig::new().snapshot_store(Path::new("/data/gods.csv"));
        assert_eq!(store.root(), Path::new("/data/gods.csv.rowmend"));
    }

    #[test]
    fn store_records_configured_separator() {
        use rowmend_recovery::SnapshotStore;

        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::new()
            .with_separator(ParagraphSeparator::Escaped)
            .with_snapshot_dir(dir.path());
        let mut store = config.snapshot_store(&dir.path().join("gods.csv"));
        store
            .put(&rowmend_test_utils::gods_records(3), chrono::Utc::now())
            .unwrap();

        let latest = store.get_latest().unwrap().unwrap();
        assert_eq!(latest.separator(), ParagraphSeparator::Escaped);
    }
}
