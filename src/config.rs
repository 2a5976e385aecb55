//! Configuration loaded from TOML.
//!
//! Controls which category table is used, how reversal groups records into
//! batches, where the operation log lives and which files are never touched.
//!
//! # Configuration File Format
//!
//! ```toml
//! [organize]
//! table = "v2"
//! batch_window_secs = 5
//! date_layout = "flat"
//!
//! [organize.custom_categories]
//! Pictures = [".png", ".jpg"]
//!
//! [filters]
//! enable_hidden_files = true
//! excluded_dirs = ["/home/me/Downloads/keep"]
//!
//! [filters.exclude]
//! filenames = ["desktop.ini"]
//! patterns = ["*.part"]
//! extensions = ["crdownload"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use crate::file_category::{CategoryTable, DateLayout, TableError, TypeTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".onlyfilesrc.toml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("Invalid category table: {0}")]
    InvalidTable(#[from] TableError),

    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub organize: OrganizeSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Settings for organizing and reverting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeSettings {
    /// Built-in category table used in type-mode.
    #[serde(default)]
    pub table: TypeTable,

    /// Maximum gap in seconds between two move records of the same batch.
    #[serde(default = "default_batch_window_secs")]
    pub batch_window_secs: u64,

    /// Folder layout for date-mode.
    #[serde(default)]
    pub date_layout: DateLayout,

    /// Overrides the per-user operation log location.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Replaces the built-in table when present.
    #[serde(default)]
    pub custom_categories: Option<BTreeMap<String, Vec<String>>>,

    /// Catch-all name for a custom table.
    #[serde(default = "default_catch_all")]
    pub catch_all: String,
}

fn default_batch_window_secs() -> u64 {
    5
}

fn default_catch_all() -> String {
    "Others".to_string()
}

impl Default for OrganizeSettings {
    fn default() -> Self {
        Self {
            table: TypeTable::default(),
            batch_window_secs: default_batch_window_secs(),
            date_layout: DateLayout::default(),
            log_file: None,
            custom_categories: None,
            catch_all: default_catch_all(),
        }
    }
}

/// Rules deciding which entries are never organized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether hidden files (starting with ".") are organized. Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    /// Absolute directories whose contents are never touched.
    #[serde(default)]
    pub excluded_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides the exclude rules but not protected paths.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            excluded_dirs: Vec::new(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "desktop.ini").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, without the dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `.onlyfilesrc.toml` in the current directory
    /// 3. `<config_dir>/onlyfiles/config.toml`
    /// 4. built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file cannot be read, or if
    /// any file found is invalid.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(user_config) =
            dirs::config_dir().map(|dir| dir.join("onlyfiles").join("config.toml"))
            && user_config.exists()
        {
            return Self::load_from_file(&user_config);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// The category table is built once here so overlapping extensions are
    /// reported at load time rather than mid-organize.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.category_table()?;
        Ok(config)
    }

    /// The category table selected by this configuration.
    pub fn category_table(&self) -> Result<CategoryTable, ConfigError> {
        match &self.organize.custom_categories {
            Some(custom) => Ok(CategoryTable::new(custom, &self.organize.catch_all)?),
            None => Ok(self.organize.table.table()),
        }
    }

    /// Gap threshold for batch grouping.
    pub fn batch_window(&self) -> Duration {
        Duration::from_secs(self.organize.batch_window_secs)
    }
}
