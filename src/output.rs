//! Console output formatting and styling.
//!
//! All operator-facing output goes through [`OutputFormatter`], so the
//! color scheme and stream choice live in one place.

use crate::activity_log::{ActivityLog, LogEntry};
use colored::*;

/// Prints run progress and results with consistent styling.
///
/// - Log entries on stdout, error entries repeated on stderr
/// - Success messages (green with ✓)
/// - Error messages (red with ✗, stderr)
/// - Warning messages (yellow with ⚠)
/// - A summary table of moved files per prefix
pub struct OutputFormatter;

impl OutputFormatter {
    /// Mirrors a log entry to the console.
    ///
    /// Every entry goes to stdout; error entries are also written to stderr.
    pub fn entry(entry: &LogEntry) {
        match entry {
            LogEntry::Failed { .. } => {
                println!("{}", entry.to_string().red());
                eprintln!("{}", entry);
            }
            LogEntry::Skipped { .. } => println!("{}", entry.to_string().yellow()),
            LogEntry::WouldCreate { .. } | LogEntry::WouldMove { .. } => {
                println!("{}", entry.to_string().cyan())
            }
            _ => println!("{}", entry),
        }
    }

    /// Mirrors every entry of `log`, in order.
    pub fn entries(log: &ActivityLog) {
        for entry in log {
            Self::entry(entry);
        }
    }

    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use prefixsort::output::OutputFormatter;
    /// OutputFormatter::success("Report generated");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark on stderr.
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

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints the number of files moved into each prefix directory, followed
    /// by the skip and error totals.
    pub fn summary_table(log: &ActivityLog) {
        Self::header("SUMMARY");

        let moves = log.moves_by_prefix();
        let total: usize = moves.values().sum();

        let width = moves
            .keys()
            .map(|p| p.chars().count())
            .max()
            .unwrap_or(0)
            .max(9); // "Directory"

        println!(
            "{:<width$} | {}",
            "Directory".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (prefix, count) in &moves {
            println!(
                "{:<width$} | {} {}",
                prefix,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            plural(total),
            width = width
        );

        let skipped = log.skipped_count();
        if skipped > 0 {
            println!(
                "{:<width$} | {} {}",
                "Skipped",
                skipped.to_string().yellow(),
                plural(skipped),
                width = width
            );
        }
        let failed = log.error_count();
        if failed > 0 {
            println!(
                "{:<width$} | {} {}",
                "Failed",
                failed.to_string().red(),
                plural(failed),
                width = width
            );
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
