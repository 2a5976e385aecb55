/// Undo functionality driven by the operation log.
///
/// Move records are read back from the log, turned into
/// `(filename, destination)` pairs and replayed in reverse: the file at
/// `destination/filename` goes back to the parent of `destination`. This
/// assumes every move went exactly one level down into a category folder.
///
/// Three selections are supported: a single record, the most recent batch
/// (records whose timestamps are chained by gaps no larger than a window),
/// and an arbitrary subset chosen by index.
use crate::file_organizer::{move_file, unique_destination};
use crate::operation_log::{Action, LogError, LogEvent, LogRecord, OperationLog, TIMESTAMP_FORMAT};
use chrono::{Local, NaiveDateTime};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Markers identifying a human-readable move line, per localization.
pub const MOVE_MARKERS: &[&str] = &["moved to folder", "movido para a pasta"];

const REVERT_MARKER: &str = "reverted to";

const RETIRE_MARKER: &str = "missing from folder";

/// `Moved <name> to <dir>` lines written by older versions.
static LEGACY_MOVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^| - )Moved (?P<file>.+?) to (?P<dest>.+?)\s*$")
        .expect("legacy move pattern is valid")
});

/// A log line that does not describe a revertible move.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LogFormatError {
    #[error("line is not a move record")]
    NotAMoveRecord,

    #[error("expected at least 5 quote-delimited segments, found {0}")]
    TooFewSegments(usize),

    #[error("malformed JSON record: {0}")]
    BadJson(String),
}

/// A parsed move: `filename` now lives in `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub filename: String,
    pub destination: PathBuf,
}

impl MoveRecord {
    /// Parses a log line written as JSON or as a human-readable line.
    pub fn parse(line: &str) -> Result<Self, LogFormatError> {
        match parse_line(line)? {
            Parsed::Move(record) => Ok(record),
            Parsed::Revert { .. } | Parsed::Retire { .. } => Err(LogFormatError::NotAMoveRecord),
        }
    }

    /// Where the file currently is.
    pub fn current_path(&self) -> PathBuf {
        self.destination.join(&self.filename)
    }

    /// Directory the file came from: the parent of the destination.
    pub fn source_dir(&self) -> Option<&Path> {
        self.destination
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }
}

enum Parsed {
    Move(MoveRecord),
    Revert { filename: String, restored_to: PathBuf },
    Retire { filename: String, destination: PathBuf },
}

fn parse_line(line: &str) -> Result<Parsed, LogFormatError> {
    let line = line.trim();

    if line.starts_with('{') {
        let record: LogRecord =
            serde_json::from_str(line).map_err(|e| LogFormatError::BadJson(e.to_string()))?;
        let (Some(filename), Some(destination)) = (record.filename, record.destination) else {
            return Err(LogFormatError::NotAMoveRecord);
        };
        return match record.action {
            Action::Move => Ok(Parsed::Move(MoveRecord {
                timestamp: Some(record.timestamp),
                filename,
                destination: PathBuf::from(destination),
            })),
            Action::Revert => Ok(Parsed::Revert {
                filename,
                restored_to: PathBuf::from(destination),
            }),
            Action::Retire => Ok(Parsed::Retire {
                filename,
                destination: PathBuf::from(destination),
            }),
            _ => Err(LogFormatError::NotAMoveRecord),
        };
    }

    let timestamp = line
        .split(" - ")
        .next()
        .and_then(|ts| NaiveDateTime::parse_from_str(ts.trim(), TIMESTAMP_FORMAT).ok());

    let is_move = MOVE_MARKERS.iter().any(|marker| line.contains(marker));
    let is_retire = line.contains(RETIRE_MARKER);
    if is_move || is_retire || line.contains(REVERT_MARKER) {
        let parts: Vec<&str> = line.split('"').collect();
        if parts.len() < 5 {
            return Err(LogFormatError::TooFewSegments(parts.len()));
        }
        let filename = parts[1].to_string();
        let destination = PathBuf::from(parts[3]);
        return Ok(if is_move {
            Parsed::Move(MoveRecord {
                timestamp,
                filename,
                destination,
            })
        } else if is_retire {
            Parsed::Retire {
                filename,
                destination,
            }
        } else {
            Parsed::Revert {
                filename,
                restored_to: destination,
            }
        });
    }

    if let Some(caps) = LEGACY_MOVE.captures(line) {
        return Ok(Parsed::Move(MoveRecord {
            timestamp,
            filename: caps["file"].trim().to_string(),
            destination: PathBuf::from(caps["dest"].trim()),
        }));
    }

    Err(LogFormatError::NotAMoveRecord)
}

/// Move records still eligible for reversal, in log order.
///
/// Malformed move lines are skipped with a warning. A revert record cancels
/// the most recent earlier move of the same file out of the same folder; a
/// retire record cancels the most recent earlier move of the same file into
/// the same folder.
pub fn move_records<S: AsRef<str>>(lines: &[S]) -> Vec<MoveRecord> {
    let mut pending: Vec<MoveRecord> = Vec::new();
    for line in lines {
        let line = line.as_ref();
        match parse_line(line) {
            Ok(Parsed::Move(record)) => pending.push(record),
            Ok(Parsed::Revert {
                filename,
                restored_to,
            }) => {
                if let Some(pos) = pending.iter().rposition(|record| {
                    record.filename == filename && record.source_dir() == Some(restored_to.as_path())
                }) {
                    pending.remove(pos);
                }
            }
            Ok(Parsed::Retire {
                filename,
                destination,
            }) => {
                if let Some(pos) = pending
                    .iter()
                    .rposition(|record| record.filename == filename && record.destination == destination)
                {
                    pending.remove(pos);
                }
            }
            Err(LogFormatError::NotAMoveRecord) => {}
            Err(e) => warn!(line = %line.trim(), error = %e, "Skipping malformed move record"),
        }
    }
    pending
}

/// Indices of the most recent batch within `records`, oldest first.
///
/// Walks backwards from the newest timestamped record and keeps going while
/// the gap to the previously included record is at most `window`, so records
/// at 0s, 4s, 8s and 12s form one batch under a 5s window. This chains gaps;
/// it does not measure every record against the newest one, which would keep
/// only the 8s and 12s records. Records without a timestamp are ignored.
pub fn last_batch(records: &[MoveRecord], window: Duration) -> Vec<usize> {
    let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
    let mut batch = Vec::new();
    let mut newer: Option<NaiveDateTime> = None;

    for (index, record) in records.iter().enumerate().rev() {
        let Some(timestamp) = record.timestamp else {
            continue;
        };
        if let Some(newer) = newer
            && newer - timestamp > window
        {
            break;
        }
        batch.push(index);
        newer = Some(timestamp);
    }
    batch.reverse();
    batch
}

/// Result of reverting a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertOutcome {
    /// The file was moved back to this path.
    Restored(PathBuf),
    /// Nothing at the recorded location.
    NotFound(PathBuf),
    /// The file exists but could not be moved back.
    Failed(PathBuf, String),
}

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Files that failed to restore.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files that were skipped (e.g., file not found, unknown index).
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    fn add(&mut self, outcome: RevertOutcome) {
        match outcome {
            RevertOutcome::Restored(_) => self.restored_files += 1,
            RevertOutcome::NotFound(path) => self
                .skipped_files
                .push((path, "File not found at expected location".to_string())),
            RevertOutcome::Failed(path, reason) => self.failed_restores.push((path, reason)),
        }
    }

    /// Returns the total number of records processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if every processed record was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }

    /// True when there was nothing to revert.
    pub fn is_empty(&self) -> bool {
        self.total_processed() == 0
    }
}

/// Replays move records in reverse.
#[derive(Debug)]
pub struct UndoManager {
    log: Arc<OperationLog>,
    batch_window: Duration,
}

impl UndoManager {
    pub fn new(log: Arc<OperationLog>, batch_window: Duration) -> Self {
        Self { log, batch_window }
    }

    /// Revertible move records currently in the log.
    pub fn pending_moves(&self) -> Result<Vec<MoveRecord>, LogError> {
        Ok(move_records(&self.log.read_all()?))
    }

    /// Moves one file back to the parent of its recorded destination.
    ///
    /// A file already sitting at the restore target is never overwritten;
    /// the restored file gets a timestamped name instead. A file missing from
    /// its destination is retired in the log so later batch reverts move past
    /// it.
    pub fn revert_one(&self, record: &MoveRecord) -> Result<RevertOutcome, LogError> {
        let current = record.current_path();
        if !current.is_file() {
            warn!(file = %record.filename, destination = %record.destination.display(), "File not found, skipping");
            self.log.record(LogEvent::Missing {
                filename: &record.filename,
                destination: &record.destination,
            })?;
            return Ok(RevertOutcome::NotFound(current));
        }

        let Some(source_dir) = record.source_dir() else {
            return Ok(RevertOutcome::Failed(
                current,
                "destination has no parent directory".to_string(),
            ));
        };

        let target = unique_destination(source_dir, &record.filename, Local::now().naive_local());
        if let Err(e) = move_file(&current, &target) {
            warn!(file = %record.filename, error = %e, "Failed to revert file");
            return Ok(RevertOutcome::Failed(current, e.to_string()));
        }

        self.log.record(LogEvent::Reverted {
            filename: &record.filename,
            restored_to: source_dir,
        })?;
        info!(file = %record.filename, restored_to = %source_dir.display(), "File reverted");
        Ok(RevertOutcome::Restored(target))
    }

    /// Reverts the most recent batch found in `lines`.
    pub fn revert_last_batch<S: AsRef<str>>(&self, lines: &[S]) -> Result<UndoReport, LogError> {
        let records = move_records(lines);
        let batch = last_batch(&records, self.batch_window);
        if batch.is_empty() {
            warn!("No move records found for reversion");
            return Ok(UndoReport::default());
        }
        debug!(records = batch.len(), "Reverting last batch");
        self.revert_indices(&records, &batch)
    }

    /// Reverts the records at `indices` of [`move_records`]`(lines)`.
    ///
    /// Unknown indices are reported as skipped; duplicates are ignored.
    pub fn revert_selected<S: AsRef<str>>(
        &self,
        lines: &[S],
        indices: &[usize],
    ) -> Result<UndoReport, LogError> {
        let records = move_records(lines);
        let mut selected: Vec<usize> = indices.to_vec();
        selected.sort_unstable();
        selected.dedup();

        let (valid, invalid): (Vec<usize>, Vec<usize>) =
            selected.into_iter().partition(|&i| i < records.len());

        let mut report = self.revert_indices(&records, &valid)?;
        for index in invalid {
            warn!(index, "No move record at this index");
            report
                .skipped_files
                .push((PathBuf::new(), format!("No move record at index {}", index)));
        }
        Ok(report)
    }

    /// Reads the log and reverts its most recent batch.
    pub fn undo_last(&self) -> Result<UndoReport, LogError> {
        let lines = self.log.read_all()?;
        self.revert_last_batch(&lines)
    }

    /// Reverts `indices` (ascending) newest first.
    fn revert_indices(
        &self,
        records: &[MoveRecord],
        indices: &[usize],
    ) -> Result<UndoReport, LogError> {
        let mut order: Vec<&MoveRecord> = indices.iter().map(|&i| &records[i]).collect();
        // Newest first; log order breaks ties between equal timestamps.
        order.reverse();
        order.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut report = UndoReport::default();
        for record in order {
            report.add(self.revert_one(record)?);
        }

        if report.is_complete_success() {
            info!(restored = report.restored_files, "Reverted selection");
        } else {
            warn!(
                restored = report.restored_files,
                skipped = report.skipped_files.len(),
                failed = report.failed_restores.len(),
                "Selection partially reverted"
            );
        }
        Ok(report)
    }
}
