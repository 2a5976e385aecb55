//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! a spinner while a batch runs, and summary tables for organize, undo and
//! log listings.

use crate::file_organizer::OrganizationResult;
use crate::operation_log::display_line;
use crate::undo::{MoveRecord, UndoReport};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use onlyfiles::output::OutputFormatter;
    /// OutputFormatter::success("Files organized successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Spinner shown while a batch is processed. Finish it before printing
    /// the summary.
    ///
    /// ```no_run
    /// use onlyfiles::output::OutputFormatter;
    /// let spinner = OutputFormatter::create_spinner("Organizing...");
    /// spinner.finish_and_clear();
    /// ```
    pub fn create_spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Prints a summary table with moved-file counts by category, followed by
    /// any per-file failures.
    pub fn summary_table(result: &OrganizationResult) {
        Self::header("SUMMARY");

        let counts = result.counts();
        let total_files = result.total_moved();

        // At least "Category" wide
        let width = counts.keys().map(|name| name.len()).max().unwrap_or(0).max(8);

        println!("{:<width$} | {}", "Category".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));

        for (category, count) in &counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count, "file"),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files, "file"),
            width = width
        );

        if !result.failed.is_empty() {
            Self::warning(&format!(
                "{} {} could not be moved:",
                result.failed.len(),
                plural(result.failed.len(), "file")
            ));
            for (path, reason) in &result.failed {
                eprintln!("    - {}: {}", path.display(), reason);
            }
        }
    }

    /// Lists what a dry run would move, category by category.
    pub fn preview(result: &OrganizationResult) {
        for (category, files) in &result.moved {
            println!("{}/", category.bold());
            for file in files {
                println!("   → {}", file);
            }
        }
    }

    pub fn undo_report(report: &UndoReport) {
        if report.is_empty() {
            Self::warning("Nothing to revert.");
            return;
        }

        Self::success(&format!(
            "Restored {} {}",
            report.restored_files,
            plural(report.restored_files, "file")
        ));

        if !report.skipped_files.is_empty() {
            Self::warning(&format!("Skipped: {}", report.skipped_files.len()));
            for (path, reason) in &report.skipped_files {
                println!("    - {}: {}", path.display(), reason);
            }
        }

        if !report.failed_restores.is_empty() {
            Self::error(&format!("Failed: {}", report.failed_restores.len()));
            for (path, reason) in &report.failed_restores {
                eprintln!("    - {}: {}", path.display(), reason);
            }
        }
    }

    /// Numbered list of revertible moves, as accepted by `--revert-select`.
    pub fn move_list(records: &[MoveRecord]) {
        if records.is_empty() {
            Self::info("No revertible moves recorded.");
            return;
        }
        for (index, record) in records.iter().enumerate() {
            let when = record
                .timestamp
                .map(|ts| ts.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:>4}  {}  {} → {}",
                index.to_string().cyan(),
                when.dimmed(),
                record.filename,
                record.destination.display()
            );
        }
    }

    /// Prints raw log lines in their human-readable form.
    pub fn log_lines<S: AsRef<str>>(lines: &[S]) {
        if lines.is_empty() {
            Self::info("The operation log is empty.");
            return;
        }
        for line in lines {
            println!("{}", display_line(line.as_ref()));
        }
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
