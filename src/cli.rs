//! Command-line interface for onlyfiles.
//!
//! Parses flags with clap, merges them over the loaded configuration and
//! dispatches to the organizer, the undo manager, the backup functions or
//! the operation log.

use crate::backup;
use crate::config::Config;
use crate::file_category::{ClassificationMode, DateLayout, TypeTable};
use crate::file_organizer::FileOrganizer;
use crate::operation_log::{LogEvent, OperationLog};
use crate::output::OutputFormatter;
use crate::undo::UndoManager;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// OnlyFiles - organize a directory into category folders, with undo
///
/// Every move is written to an operation log so the last batch, or any
/// chosen set of moves, can be reverted later.
#[derive(Parser, Debug)]
#[command(name = "onlyfiles")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Verbose diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Operation log location (overrides the configuration)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Directory to work with
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Organize by type using the category table
    #[arg(short = 't', long = "type", group = "mode")]
    pub by_type: bool,

    /// Organize into one folder per extension
    #[arg(short, long, group = "mode")]
    pub extension: bool,

    /// Organize by creation month
    #[arg(long, group = "mode")]
    pub date: bool,

    /// Organize by size bucket
    #[arg(short, long, group = "mode")]
    pub size: bool,

    /// Show what would be moved without moving anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Built-in category table
    #[arg(long, value_enum)]
    pub table: Option<TypeTable>,

    /// Folder layout for --date
    #[arg(long, value_enum)]
    pub date_layout: Option<DateLayout>,

    /// Move files of --directory with the --only extensions into this folder
    #[arg(long, requires = "only")]
    pub move_to: Option<PathBuf>,

    /// Extensions for --move-to, comma separated
    #[arg(long, value_delimiter = ',')]
    pub only: Option<Vec<String>>,

    /// Move files of --directory that match no category into this folder
    #[arg(long)]
    pub move_others: Option<PathBuf>,

    /// Back up the directory before anything else
    #[arg(short, long)]
    pub backup: bool,

    /// Restore the directory from its newest backup
    #[arg(long)]
    pub restore_backup: bool,

    /// Revert the most recent batch of moves
    #[arg(short, long)]
    pub revert: bool,

    /// Revert the moves at these indices (see --list-moves)
    #[arg(long, value_delimiter = ',')]
    pub revert_select: Option<Vec<usize>>,

    /// List revertible moves with their indices
    #[arg(long)]
    pub list_moves: bool,

    /// Print the operation log
    #[arg(long)]
    pub logs: bool,

    /// Empty the operation log
    #[arg(long)]
    pub clear_logs: bool,
}

impl Cli {
    /// Applies flag overrides on top of a loaded configuration.
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(table) = self.table {
            config.organize.table = table;
            config.organize.custom_categories = None;
        }
        if let Some(layout) = self.date_layout {
            config.organize.date_layout = layout;
        }
        if let Some(ref log_file) = self.log_file {
            config.organize.log_file = Some(log_file.clone());
        }
        config
    }

    /// The organize mode selected by flags, if any.
    pub fn mode(&self, layout: DateLayout) -> Option<ClassificationMode> {
        if self.by_type {
            Some(ClassificationMode::Type)
        } else if self.extension {
            Some(ClassificationMode::Extension)
        } else if self.size {
            Some(ClassificationMode::Size)
        } else if self.date {
            Some(ClassificationMode::Date(layout))
        } else {
            None
        }
    }

    fn has_directory_action(&self) -> bool {
        self.by_type
            || self.extension
            || self.size
            || self.date
            || self.backup
            || self.restore_backup
            || self.move_to.is_some()
            || self.move_others.is_some()
    }
}

/// Runs the parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.merge_with_config(Config::load(cli.config.as_deref())?);
    let log_path = config
        .organize
        .log_file
        .clone()
        .unwrap_or_else(OperationLog::default_path);
    debug!(log = %log_path.display(), "Using operation log");
    let log = Arc::new(OperationLog::new(log_path));

    if cli.logs {
        OutputFormatter::header("OPERATION LOG");
        OutputFormatter::log_lines(&log.read_all()?);
        return Ok(());
    }

    if cli.clear_logs {
        log.clear()?;
        OutputFormatter::success("Operation log cleared");
        return Ok(());
    }

    let undo = UndoManager::new(Arc::clone(&log), config.batch_window());

    if cli.list_moves {
        OutputFormatter::header("REVERTIBLE MOVES");
        OutputFormatter::move_list(&undo.pending_moves()?);
        return Ok(());
    }

    if cli.revert {
        OutputFormatter::info("Reverting last batch...");
        OutputFormatter::undo_report(&undo.undo_last()?);
        return Ok(());
    }

    if let Some(indices) = &cli.revert_select {
        let lines = log.read_all()?;
        OutputFormatter::undo_report(&undo.revert_selected(&lines, indices)?);
        return Ok(());
    }

    let Some(directory) = cli.directory.as_deref() else {
        bail!("Nothing to do. Pass --directory with an action, or one of --revert, --list-moves, --logs");
    };
    if !cli.has_directory_action() {
        bail!("Choose what to do with {}: --type, --extension, --date, --size, --backup, --restore-backup, --move-to or --move-others", directory.display());
    }
    if !directory.is_dir() {
        bail!("{} is not a directory", directory.display());
    }

    if cli.backup {
        let backup_dir = backup::create_backup(directory)
            .with_context(|| format!("Failed to back up {}", directory.display()))?;
        log.record(LogEvent::Note(format!(
            "Backup of \"{}\" created at \"{}\".",
            directory.display(),
            backup_dir.display()
        )))?;
        OutputFormatter::success(&format!("Backup created at {}", backup_dir.display()));
    }

    if cli.restore_backup {
        if backup::revert_to_latest_backup(directory)? {
            log.record(LogEvent::Note(format!(
                "Directory \"{}\" restored from backup.",
                directory.display()
            )))?;
            OutputFormatter::success(&format!("Restored {} from its latest backup", directory.display()));
        } else {
            OutputFormatter::warning(&format!("No backup found in {}", directory.display()));
        }
    }

    let organizer = FileOrganizer::builder(Arc::clone(&log))
        .table(config.category_table()?)
        .filters(&config.filters)
        .build()?;

    if let Some(mode) = cli.mode(config.organize.date_layout) {
        organize(&organizer, directory, mode, cli.dry_run)?;
    }

    if let (Some(destination), Some(extensions)) = (&cli.move_to, &cli.only) {
        let moved = organizer.move_by_type(directory, destination, extensions)?;
        report_moved(&moved, destination);
    }

    if let Some(destination) = &cli.move_others {
        let moved = organizer.move_others(directory, destination, organizer.table())?;
        report_moved(&moved, destination);
    }

    Ok(())
}

fn organize(
    organizer: &FileOrganizer,
    directory: &Path,
    mode: ClassificationMode,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", directory.display()));
        let result = organizer.preview(directory, mode)?;
        if result.is_empty() {
            OutputFormatter::info("No files found to organize.");
            return Ok(());
        }
        OutputFormatter::preview(&result);
        OutputFormatter::summary_table(&result);
        OutputFormatter::dry_run_notice("No files were modified.");
        return Ok(());
    }

    OutputFormatter::info(&format!("Organizing contents of: {}", directory.display()));
    let spinner = OutputFormatter::create_spinner("Moving files...");
    let result = organizer.organize(directory, mode);
    spinner.finish_and_clear();
    let result = result?;

    if result.is_empty() {
        OutputFormatter::info("No files found to organize.");
        return Ok(());
    }
    OutputFormatter::summary_table(&result);
    if result.total_moved() > 0 {
        OutputFormatter::success("Organization complete! Use --revert to undo it.");
    }
    Ok(())
}

fn report_moved(moved: &[String], destination: &Path) {
    if moved.is_empty() {
        OutputFormatter::warning("No files were moved");
    } else {
        OutputFormatter::success(&format!(
            "Moved {} files to {}",
            moved.len(),
            destination.display()
        ));
    }
}
