//! Whole-directory snapshots taken before organizing.
//!
//! A backup is a recursive copy of a directory into a child folder named
//! `backup_<unix millis>`. Older backups are never copied into newer ones.
//! Restoring merges the newest backup back over the live directory: files in
//! the backup overwrite their live counterparts, everything else is left in
//! place.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Prefix of every backup folder name.
pub const BACKUP_PREFIX: &str = "backup_";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("backup already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to copy {} to {}: {error}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("failed to list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Copies `directory` into a fresh `backup_<millis>` child and returns its path.
pub fn create_backup(directory: &Path) -> Result<PathBuf, BackupError> {
    if !directory.is_dir() {
        return Err(BackupError::NotADirectory(directory.to_path_buf()));
    }

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let backup_dir = directory.join(format!("{}{}", BACKUP_PREFIX, millis));
    if backup_dir.exists() {
        return Err(BackupError::AlreadyExists(backup_dir));
    }

    fs::create_dir(&backup_dir).map_err(|e| BackupError::Io {
        path: backup_dir.clone(),
        source: e,
    })?;
    let copied = copy_tree(directory, &backup_dir)?;

    info!(backup = %backup_dir.display(), files = copied, "Created backup");
    Ok(backup_dir)
}

/// Restores the newest backup of `directory`.
///
/// Returns `Ok(false)` when there is no backup to restore.
pub fn revert_to_latest_backup(directory: &Path) -> Result<bool, BackupError> {
    let Some(latest) = latest_backup(directory)? else {
        warn!(directory = %directory.display(), "No backup found");
        return Ok(false);
    };

    let restored = copy_tree(&latest, directory)?;
    info!(backup = %latest.display(), files = restored, "Restored backup");
    Ok(true)
}

/// Backups of `directory`, oldest first.
pub fn list_backups(directory: &Path) -> Result<Vec<PathBuf>, BackupError> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(BackupError::Io {
                path: directory.to_path_buf(),
                source: e,
            });
        }
    };

    let mut backups: Vec<(u128, PathBuf)> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let stamp = backup_stamp(&entry.file_name().to_string_lossy())?;
            Some((stamp, entry.path()))
        })
        .collect();
    backups.sort();
    Ok(backups.into_iter().map(|(_, path)| path).collect())
}

/// The backup with the numerically greatest suffix.
pub fn latest_backup(directory: &Path) -> Result<Option<PathBuf>, BackupError> {
    Ok(list_backups(directory)?.pop())
}

fn backup_stamp(name: &str) -> Option<u128> {
    name.strip_prefix(BACKUP_PREFIX)?.parse().ok()
}

fn is_backup_dir(name: &str) -> bool {
    backup_stamp(name).is_some()
}

/// Copies every file under `from` into `to`, skipping backup folders at the
/// top level of `from`. Returns the number of files copied.
fn copy_tree(from: &Path, to: &Path) -> Result<usize, BackupError> {
    let walker = WalkDir::new(from)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() == 1
                && entry.file_type().is_dir()
                && is_backup_dir(&entry.file_name().to_string_lossy()))
        });

    let mut copied = 0;
    for entry in walker {
        let entry = entry.map_err(|e| BackupError::Walk {
            path: from.to_path_buf(),
            source: e,
        })?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| BackupError::Io {
                path: target.clone(),
                source: e,
            })?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(|e| BackupError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                error: e,
            })?;
            copied += 1;
        } else {
            debug!(path = %entry.path().display(), "Skipping non-regular entry");
        }
    }
    Ok(copied)
}
