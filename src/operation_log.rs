//! Persistent, append-only record of file operations.
//!
//! Each line of the log file is one JSON object describing a single event.
//! Lines render to the human-readable form
//! `<YYYY-MM-DD HH:MM:SS> - <LEVEL> - <message>`, and move events render as
//! `File "<name>" moved to folder "<destination>".` so that either form can
//! be parsed back into the pair it came from.
//!
//! The log is shared between engines through an `Arc<OperationLog>`; appends
//! are serialized by an internal lock so lines never interleave.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Timestamp layout shared by the JSON records and the rendered lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default file name of the operation log.
pub const LOG_FILE_NAME: &str = "operations.log";

/// Errors raised while reading or writing the log file.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("operation log I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// What a record describes. Only [`Action::Move`] records are revertible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Move,
    Revert,
    Retire,
    MoveFailed,
    Note,
}

/// An event handed to [`OperationLog::record`].
#[derive(Debug, Clone)]
pub enum LogEvent<'a> {
    /// A file now lives at `destination/filename`.
    Moved {
        filename: &'a str,
        destination: &'a Path,
    },
    /// A file was moved back from a category folder into `restored_to`.
    Reverted {
        filename: &'a str,
        restored_to: &'a Path,
    },
    /// A moved file is gone from `destination`; its move can no longer be
    /// reverted.
    Missing {
        filename: &'a str,
        destination: &'a Path,
    },
    /// A move was attempted and failed.
    MoveFailed { filename: &'a str, reason: String },
    /// Free-form message (backups, log maintenance).
    Note(String),
}

/// One line of the operation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub level: Level,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LogRecord {
    /// Builds the record for `event` stamped with `timestamp`.
    pub fn from_event(event: &LogEvent<'_>, timestamp: NaiveDateTime) -> Self {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        match event {
            LogEvent::Moved {
                filename,
                destination,
            } => Self {
                timestamp,
                level: Level::Info,
                action: Action::Move,
                filename: Some(filename.to_string()),
                destination: Some(destination.to_string_lossy().into_owned()),
                message: None,
            },
            LogEvent::Reverted {
                filename,
                restored_to,
            } => Self {
                timestamp,
                level: Level::Info,
                action: Action::Revert,
                filename: Some(filename.to_string()),
                destination: Some(restored_to.to_string_lossy().into_owned()),
                message: None,
            },
            LogEvent::Missing {
                filename,
                destination,
            } => Self {
                timestamp,
                level: Level::Warning,
                action: Action::Retire,
                filename: Some(filename.to_string()),
                destination: Some(destination.to_string_lossy().into_owned()),
                message: None,
            },
            LogEvent::MoveFailed { filename, reason } => Self {
                timestamp,
                level: Level::Error,
                action: Action::MoveFailed,
                filename: Some(filename.to_string()),
                destination: None,
                message: Some(reason.clone()),
            },
            LogEvent::Note(message) => Self {
                timestamp,
                level: Level::Info,
                action: Action::Note,
                filename: None,
                destination: None,
                message: Some(message.clone()),
            },
        }
    }

    /// Parses a JSON log line. Returns `None` for anything else.
    pub fn from_json_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        serde_json::from_str(line).ok()
    }

    /// The human-readable message part of the line.
    pub fn message(&self) -> String {
        let filename = self.filename.as_deref().unwrap_or_default();
        let destination = self.destination.as_deref().unwrap_or_default();
        match self.action {
            Action::Move => format!("File \"{}\" moved to folder \"{}\".", filename, destination),
            Action::Revert => format!("File \"{}\" reverted to \"{}\".", filename, destination),
            Action::Retire => format!(
                "File \"{}\" missing from folder \"{}\"; move retired.",
                filename, destination
            ),
            Action::MoveFailed => format!(
                "Error moving file {}: {}",
                filename,
                self.message.as_deref().unwrap_or("unknown error")
            ),
            Action::Note => self.message.clone().unwrap_or_default(),
        }
    }

    /// Renders the full `<timestamp> - <LEVEL> - <message>` line.
    pub fn render(&self) -> String {
        format!(
            "{} - {} - {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.level,
            self.message()
        )
    }
}

/// Renders a raw log line for display; lines that are not JSON records are
/// shown unchanged.
pub fn display_line(line: &str) -> String {
    LogRecord::from_json_line(line)
        .map(|record| record.render())
        .unwrap_or_else(|| line.trim_end().to_string())
}

mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Handle on the operation log file.
#[derive(Debug)]
pub struct OperationLog {
    path: PathBuf,
    writer: Mutex<()>,
}

impl OperationLog {
    /// Opens (lazily) the log at `path`. Nothing touches the disk until the
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    /// Per-user location of the log:
    /// `<data_dir>/onlyfiles/logs/operations.log`, falling back to the home
    /// directory and then the working directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("onlyfiles").join("logs"))
            .or_else(|| dirs::home_dir().map(|home| home.join(".onlyfiles")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(LOG_FILE_NAME)
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `event`, stamped with the current local time.
    pub fn record(&self, event: LogEvent<'_>) -> Result<(), LogError> {
        let record = LogRecord::from_event(&event, Local::now().naive_local());
        self.append(&record)
    }

    /// Appends a fully built record as one line.
    pub fn append(&self, record: &LogRecord) -> Result<(), LogError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;

        debug!(line = %record.render(), "Appended operation record");
        Ok(())
    }

    /// Returns every line in append order. A missing log yields no lines.
    pub fn read_all(&self) -> Result<Vec<String>, LogError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Truncates the log to zero length. The file itself is kept.
    pub fn clear(&self) -> Result<(), LogError> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if !self.path.exists() {
            return Ok(());
        }
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map(|_| ())
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
