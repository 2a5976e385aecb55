//! Paths and file names the organizer must never touch.
//!
//! An [`ExclusionSet`] is built once per engine and is immutable afterwards.
//! Excluded directories and exact file names (the operation log and its
//! folder among them) always win. The remaining filter rules are checked
//! afterwards, in this order:
//!
//! 1. include patterns (whitelist) - if matched, keep
//! 2. hidden files, when disabled
//! 3. extension
//! 4. glob pattern
//! 5. regex on the file name

use crate::config::{ConfigError, FilterRules};
use crate::path_validator::absolute;
use glob::Pattern;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Immutable exclusion state held by an engine.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    dirs: Vec<PathBuf>,
    filenames: HashSet<String>,
    skip_hidden: bool,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl ExclusionSet {
    pub fn builder() -> ExclusionSetBuilder {
        ExclusionSetBuilder::default()
    }

    /// True if `path` lies under an excluded directory, has an excluded
    /// base name, or is rejected by the filter rules.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.filenames.contains(file_name.as_ref()) {
            return true;
        }

        if !self.dirs.is_empty() {
            let resolved = absolute(path);
            if self.dirs.iter().any(|dir| resolved.starts_with(dir)) {
                return true;
            }
        }

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path) || pattern.matches(&file_name))
        {
            return false;
        }

        if self.skip_hidden && file_name.starts_with('.') {
            return true;
        }

        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.extensions.contains(&ext_lower) {
                return true;
            }
        }

        if self
            .patterns
            .iter()
            .any(|pattern| pattern.matches_path(path) || pattern.matches(&file_name))
        {
            return true;
        }

        self.regexes.iter().any(|regex| regex.is_match(&file_name))
    }

    /// Protected directories, resolved to absolute paths.
    pub fn excluded_dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

/// Collects exclusions before freezing them into an [`ExclusionSet`].
#[derive(Debug, Default)]
pub struct ExclusionSetBuilder {
    dirs: Vec<PathBuf>,
    filenames: Vec<String>,
    rules: Option<FilterRules>,
}

impl ExclusionSetBuilder {
    /// Never touch anything under `dir`.
    pub fn exclude_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dirs.push(dir.as_ref().to_path_buf());
        self
    }

    /// Never touch entries named `name`, wherever they are.
    pub fn exclude_file(mut self, name: impl Into<String>) -> Self {
        self.filenames.push(name.into());
        self
    }

    /// Protects the operation log: its base name and its directory.
    pub fn protect_log(self, log_path: &Path) -> Self {
        let mut builder = self;
        if let Some(name) = log_path.file_name() {
            builder = builder.exclude_file(name.to_string_lossy());
        }
        match log_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => builder.exclude_dir(parent),
            _ => builder,
        }
    }

    /// Applies configured filter rules, including their excluded directories.
    pub fn filters(mut self, rules: &FilterRules) -> Self {
        self.dirs.extend(rules.excluded_dirs.iter().cloned());
        self.rules = Some(rules.clone());
        self
    }

    /// Compiles patterns and freezes the set.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn build(self) -> Result<ExclusionSet, ConfigError> {
        let mut set = ExclusionSet {
            dirs: self.dirs.iter().map(|dir| absolute(dir)).collect(),
            filenames: self.filenames.into_iter().collect(),
            ..ExclusionSet::default()
        };
        set.dirs.dedup();

        let Some(rules) = self.rules else {
            return Ok(set);
        };

        set.skip_hidden = !rules.enable_hidden_files;
        set.filenames.extend(rules.exclude.filenames);
        set.extensions = rules
            .exclude
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        set.patterns = compile_globs(&rules.exclude.patterns)?;
        set.include_patterns = compile_globs(&rules.include.patterns)?;
        set.regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(set)
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
