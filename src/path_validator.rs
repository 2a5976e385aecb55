//! Source/destination validation performed before any file is moved.
//!
//! Validation is not read-only: a missing destination directory (and its
//! parents) is created as part of a successful check.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

/// Reasons a source/destination pair is rejected.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("source path is empty")]
    EmptyOrigin,

    #[error("source path does not exist: {}", .0.display())]
    OriginNotFound(PathBuf),

    #[error("source and destination are the same path: {}", .0.display())]
    SamePath(PathBuf),

    #[error("could not create destination {}: {source}", path.display())]
    CreateDestination {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Resolves `path` to an absolute path without requiring it to exist.
///
/// Missing paths are resolved through their parent so they compare equal to
/// canonicalized siblings.
pub fn absolute(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
        && let Ok(parent) = fs::canonicalize(parent)
    {
        return parent.join(name);
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Checks that `origin` exists and differs from `destination`, then creates
/// `destination` if it is missing.
///
/// Returns the absolute origin and destination on success.
pub fn validate(origin: &Path, destination: &Path) -> Result<(PathBuf, PathBuf), PathError> {
    if origin.as_os_str().is_empty() {
        error!("Rejected empty source path");
        return Err(PathError::EmptyOrigin);
    }

    if !origin.exists() {
        error!(origin = %origin.display(), "Source path does not exist");
        return Err(PathError::OriginNotFound(origin.to_path_buf()));
    }

    let origin = absolute(origin);
    let destination = absolute(destination);

    if origin == destination {
        error!(path = %origin.display(), "Source and destination are identical");
        return Err(PathError::SamePath(origin));
    }

    if !destination.exists() {
        fs::create_dir_all(&destination).map_err(|e| PathError::CreateDestination {
            path: destination.clone(),
            source: e,
        })?;
        debug!(destination = %destination.display(), "Created destination directory");
    }

    // Re-resolve now that the directory exists so symlinked parents compare equal.
    Ok((origin, absolute(&destination)))
}
