//! onlyfiles - organize a directory into category folders, with undo
//!
//! Files are classified by type, extension, size or date and moved into
//! subfolders. Every move is appended to an operation log, which the undo
//! manager reads back to revert the last batch or any chosen moves.

pub mod backup;
pub mod cli;
pub mod config;
pub mod exclusion;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod operation_log;
pub mod output;
pub mod path_validator;
pub mod undo;

pub use config::{Config, ConfigError};
pub use exclusion::ExclusionSet;
pub use file_category::{CategoryTable, ClassificationMode, DateLayout, TypeTable};
pub use file_organizer::{FileOrganizer, OrganizationResult, OrganizeError};
pub use operation_log::{LogEvent, LogRecord, OperationLog};
pub use undo::{MoveRecord, UndoManager, UndoReport};
