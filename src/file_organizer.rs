/// File organization: moving files into category subdirectories.
///
/// A [`FileOrganizer`] snapshots a directory once, classifies every regular
/// file that is not excluded, creates category folders on first use and
/// moves files into them. Every successful move is appended to the shared
/// [`OperationLog`]. A failure on one file is logged and the batch carries on.
use crate::config::{ConfigError, FilterRules};
use crate::exclusion::{ExclusionSet, ExclusionSetBuilder};
use crate::file_category::{CategoryTable, ClassificationMode, TypeTable, extension_of};
use crate::operation_log::{LogError, LogEvent, OperationLog};
use crate::path_validator::{self, PathError, absolute};
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Layout of the disambiguator appended on name collisions.
const COLLISION_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Errors that can occur during file organization operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The directory exists but cannot be listed.
    #[error("Invalid base path {}: {source}", path.display())]
    InvalidBasePath {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to move {} to {}: {error}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Could not classify {}: {source}", path.display())]
    Classification {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} has no file name component", .0.display())]
    NoFileName(PathBuf),

    #[error(transparent)]
    Validation(#[from] PathError),

    #[error(transparent)]
    Log(#[from] LogError),
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Outcome of one organize call: moved file names per category, in the
/// order they were moved, plus the files that could not be moved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationResult {
    pub moved: BTreeMap<String, Vec<String>>,
    pub failed: Vec<(PathBuf, String)>,
}

impl OrganizationResult {
    fn push(&mut self, category: &str, file_name: String) {
        self.moved
            .entry(category.to_string())
            .or_default()
            .push(file_name);
    }

    /// Files moved into `category`.
    pub fn files(&self, category: &str) -> &[String] {
        self.moved.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of files moved.
    pub fn total_moved(&self) -> usize {
        self.moved.values().map(Vec::len).sum()
    }

    /// True when nothing was moved and nothing failed.
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty() && self.failed.is_empty()
    }

    /// Moved-file counts keyed by category.
    pub fn counts(&self) -> BTreeMap<&str, usize> {
        self.moved
            .iter()
            .map(|(category, files)| (category.as_str(), files.len()))
            .collect()
    }
}

/// One file selected for moving.
#[derive(Debug, Clone)]
struct PlannedMove {
    path: PathBuf,
    name: String,
    category: String,
}

/// Moves files into category subdirectories and records each move.
#[derive(Debug)]
pub struct FileOrganizer {
    log: Arc<OperationLog>,
    exclusions: ExclusionSet,
    table: CategoryTable,
}

/// Builder for [`FileOrganizer`]; the exclusion state is frozen by `build`.
#[derive(Debug)]
pub struct FileOrganizerBuilder {
    log: Arc<OperationLog>,
    table: CategoryTable,
    exclusions: ExclusionSetBuilder,
}

impl FileOrganizerBuilder {
    /// Category table used in type-mode.
    pub fn table(mut self, table: CategoryTable) -> Self {
        self.table = table;
        self
    }

    /// Filter rules from the configuration.
    pub fn filters(mut self, rules: &FilterRules) -> Self {
        self.exclusions = self.exclusions.filters(rules);
        self
    }

    /// Protects an extra directory.
    pub fn exclude_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.exclusions = self.exclusions.exclude_dir(dir);
        self
    }

    /// Protects an extra file name.
    pub fn exclude_file(mut self, name: impl Into<String>) -> Self {
        self.exclusions = self.exclusions.exclude_file(name);
        self
    }

    /// Freezes the configuration. The operation log is always protected.
    pub fn build(self) -> Result<FileOrganizer, ConfigError> {
        let exclusions = self.exclusions.protect_log(self.log.path()).build()?;
        Ok(FileOrganizer {
            log: self.log,
            exclusions,
            table: self.table,
        })
    }
}

impl FileOrganizer {
    /// Starts a builder with the default table and no extra exclusions.
    pub fn builder(log: Arc<OperationLog>) -> FileOrganizerBuilder {
        FileOrganizerBuilder {
            log,
            table: TypeTable::default().table(),
            exclusions: ExclusionSet::builder(),
        }
    }

    /// The category table in use.
    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// The frozen exclusion set.
    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Organizes `directory` according to `mode`.
    ///
    /// A missing directory yields an empty result. Individual failures are
    /// recorded in [`OrganizationResult::failed`] and never stop the batch;
    /// only an unwritable operation log or an unlistable directory abort.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use onlyfiles::file_category::ClassificationMode;
    /// use onlyfiles::file_organizer::FileOrganizer;
    /// use onlyfiles::operation_log::OperationLog;
    /// use std::path::Path;
    /// use std::sync::Arc;
    ///
    /// let log = Arc::new(OperationLog::new(OperationLog::default_path()));
    /// let organizer = FileOrganizer::builder(log).build().unwrap();
    /// let result = organizer
    ///     .organize(Path::new("/home/me/Downloads"), ClassificationMode::Type)
    ///     .unwrap();
    /// println!("moved {} files", result.total_moved());
    /// ```
    pub fn organize(
        &self,
        directory: &Path,
        mode: ClassificationMode,
    ) -> OrganizeResult<OrganizationResult> {
        let (plan, mut result) = self.plan(directory, mode)?;
        if plan.is_empty() {
            return Ok(result);
        }
        let base = absolute(directory);
        info!(directory = %base.display(), files = plan.len(), ?mode, "Organizing directory");

        for planned in plan {
            let category_dir = base.join(&planned.category);
            match move_into(&planned.path, &category_dir) {
                Ok(final_path) => {
                    let final_name = file_name_of(&final_path).unwrap_or(planned.name);
                    self.log.record(LogEvent::Moved {
                        filename: &final_name,
                        destination: &category_dir,
                    })?;
                    result.push(&planned.category, final_name);
                }
                Err(e) => {
                    self.record_failure(&mut result.failed, &planned.path, &planned.name, e)?
                }
            }
        }

        info!(
            moved = result.total_moved(),
            failed = result.failed.len(),
            "Organization finished"
        );
        Ok(result)
    }

    /// Computes what [`organize`](Self::organize) would do without touching
    /// the filesystem.
    pub fn preview(
        &self,
        directory: &Path,
        mode: ClassificationMode,
    ) -> OrganizeResult<OrganizationResult> {
        let (plan, mut result) = self.plan(directory, mode)?;
        for planned in plan {
            result.push(&planned.category, planned.name);
        }
        Ok(result)
    }

    /// Moves files of `origin` whose extension is in `extensions` into
    /// `destination`.
    ///
    /// `destination` is validated (and created) first; a validation failure
    /// aborts before anything moves. Returns the names moved.
    pub fn move_by_type<S: AsRef<str>>(
        &self,
        origin: &Path,
        destination: &Path,
        extensions: &[S],
    ) -> OrganizeResult<Vec<String>> {
        let wanted: Vec<String> = extensions
            .iter()
            .map(|ext| {
                let ext = ext.as_ref().to_lowercase();
                if ext.starts_with('.') { ext } else { format!(".{}", ext) }
            })
            .collect();
        self.move_matching(origin, destination, |name| {
            extension_of(name).is_some_and(|ext| wanted.contains(&ext))
        })
    }

    /// Moves every file of `origin` whose extension belongs to no category of
    /// `table` into `destination`.
    pub fn move_others(
        &self,
        origin: &Path,
        destination: &Path,
        table: &CategoryTable,
    ) -> OrganizeResult<Vec<String>> {
        self.move_matching(origin, destination, |name| !table.is_known(name))
    }

    fn move_matching<F>(
        &self,
        origin: &Path,
        destination: &Path,
        matches: F,
    ) -> OrganizeResult<Vec<String>>
    where
        F: Fn(&str) -> bool,
    {
        let (origin, destination) = path_validator::validate(origin, destination)?;
        let destination_name = file_name_of(&destination);
        let mut moved = Vec::new();
        let mut failed = Vec::new();

        for (path, name) in self.snapshot(&origin)? {
            if destination_name.as_deref() == Some(name.as_str()) || !path.is_file() {
                debug!(file = %name, "Not a file, ignoring");
                continue;
            }
            if !matches(&name) {
                continue;
            }
            match move_into(&path, &destination) {
                Ok(final_path) => {
                    let final_name = file_name_of(&final_path).unwrap_or(name);
                    self.log.record(LogEvent::Moved {
                        filename: &final_name,
                        destination: &destination,
                    })?;
                    moved.push(final_name);
                }
                Err(e) => self.record_failure(&mut failed, &path, &name, e)?,
            }
        }
        if !failed.is_empty() {
            warn!(failed = failed.len(), destination = %destination.display(), "Some files were not moved");
        }
        Ok(moved)
    }

    /// Lists `directory` once, dropping excluded entries and names that are
    /// not valid UTF-8.
    fn snapshot(&self, directory: &Path) -> OrganizeResult<Vec<(PathBuf, String)>> {
        let entries = fs::read_dir(directory).map_err(|e| OrganizeError::InvalidBasePath {
            path: directory.to_path_buf(),
            source: e,
        })?;

        let mut listing = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(name) = entry.file_name().into_string() else {
                warn!(file = %path.display(), "Skipping file with non UTF-8 name");
                continue;
            };
            if self.exclusions.is_excluded(&path) {
                debug!(file = %name, "Ignored (in exclusion list)");
                continue;
            }
            listing.push((path, name));
        }
        Ok(listing)
    }

    fn plan(
        &self,
        directory: &Path,
        mode: ClassificationMode,
    ) -> OrganizeResult<(Vec<PlannedMove>, OrganizationResult)> {
        let mut result = OrganizationResult::default();
        if !directory.is_dir() {
            debug!(directory = %directory.display(), "Nothing to organize");
            return Ok((Vec::new(), result));
        }

        let mut plan = Vec::new();
        for (path, name) in self.snapshot(directory)? {
            let metadata = match fs::symlink_metadata(&path) {
                Ok(metadata) if metadata.file_type().is_file() => metadata,
                Ok(_) => {
                    debug!(file = %name, "Not a regular file, ignoring");
                    continue;
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "File vanished before it could be organized");
                    result.failed.push((path, e.to_string()));
                    continue;
                }
            };

            let category = match mode.classify(&name, Some(&metadata), &self.table) {
                Ok(category) => category,
                Err(e) => {
                    let error = OrganizeError::Classification {
                        path: path.clone(),
                        source: e,
                    };
                    warn!(file = %name, error = %error, "Could not classify file");
                    result.failed.push((path, error.to_string()));
                    continue;
                }
            };

            // A file named like its own category folder would block the folder.
            if category == name {
                debug!(file = %name, "File shares its category folder name, ignoring");
                continue;
            }

            plan.push(PlannedMove {
                path,
                name,
                category,
            });
        }
        Ok((plan, result))
    }

    fn record_failure(
        &self,
        failed: &mut Vec<(PathBuf, String)>,
        path: &Path,
        name: &str,
        error: OrganizeError,
    ) -> OrganizeResult<()> {
        warn!(file = %name, error = %error, "Failed to move file");
        self.log.record(LogEvent::MoveFailed {
            filename: name,
            reason: error.to_string(),
        })?;
        failed.push((path.to_path_buf(), error.to_string()));
        Ok(())
    }
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Moves `file_path` into `dest_dir`, creating the directory if needed and
/// never overwriting an existing file. Returns the final path.
pub fn move_into(file_path: &Path, dest_dir: &Path) -> OrganizeResult<PathBuf> {
    let file_name = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| OrganizeError::NoFileName(file_path.to_path_buf()))?;

    if !dest_dir.is_dir() {
        fs::create_dir_all(dest_dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;
        debug!(directory = %dest_dir.display(), "Created category directory");
    }

    let destination = unique_destination(dest_dir, file_name, Local::now().naive_local());
    move_file(file_path, &destination)?;
    Ok(destination)
}

/// Picks a free path for `file_name` inside `dest_dir`.
///
/// When the plain name is taken, `name_YYYYMMDD_HHMMSS.ext` is used; if that
/// is taken too a counter is appended.
pub fn unique_destination(dest_dir: &Path, file_name: &str, now: NaiveDateTime) -> PathBuf {
    let candidate = dest_dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match extension_of(file_name) {
        Some(_) => match file_name.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{}", ext)),
            None => (file_name, String::new()),
        },
        None => (file_name, String::new()),
    };
    let stamp = now.format(COLLISION_FORMAT);

    let candidate = dest_dir.join(format!("{}_{}{}", stem, stamp, ext));
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|n| dest_dir.join(format!("{}_{}_{}{}", stem, stamp, n, ext)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Renames `from` to `to`, copying and deleting when the rename crosses
/// filesystems.
pub fn move_file(from: &Path, to: &Path) -> OrganizeResult<()> {
    let failure = |error| OrganizeError::FileMoveFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error,
    };

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            debug!(from = %from.display(), "Rename crosses devices, copying instead");
            fs::copy(from, to).map_err(failure)?;
            fs::remove_file(from).map_err(failure)
        }
        Err(e) => Err(failure(e)),
    }
}
