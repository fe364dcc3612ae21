//! Command-line interface module for prefixsort.
//!
//! This module handles:
//! - Argument parsing
//! - Configuration loading and command-line overrides
//! - Orchestration: organize first, then write the report from the finished log
//! - Console reporting of the run

use crate::activity_log::ActivityLog;
use crate::config::Config;
use crate::organizer::FileOrganizer;
use crate::output::OutputFormatter;
use crate::report::{ReportStats, ReportWriter};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Group the files of a directory into subdirectories named by the first
/// four characters of their names, then write a PDF report of the run.
#[derive(Debug, Clone, Parser)]
#[command(name = "prefixsort", version, about)]
pub struct Cli {
    /// Directory whose files are organized.
    #[arg(env = "PREFIXSORT_TARGET")]
    pub directory: PathBuf,

    /// Configuration file (defaults to .prefixsortrc.toml, then ~/.config/prefixsort/config.toml).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show what would be moved without touching any file.
    #[arg(long)]
    pub dry_run: bool,

    /// File name of the report inside the target directory.
    #[arg(long, value_name = "NAME")]
    pub report_name: Option<String>,

    /// Skip the PDF report.
    #[arg(long)]
    pub no_report: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short, long)]
    pub debug: bool,
}

/// What happened to the report at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Written(ReportStats),
    /// Dry run, or reports disabled.
    NotRequested,
    /// Generation failed; completed moves are kept.
    Failed(String),
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub log: ActivityLog,
    pub report: ReportOutcome,
}

/// Runs the CLI application for parsed arguments.
///
/// Loads the configuration, applies command-line overrides and delegates
/// to [`run_with_config`].
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use prefixsort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["prefixsort", "/path/to/directory"]);
/// match run_cli(&cli) {
///     Ok(summary) => println!("{} events recorded", summary.log.len()),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<RunSummary, String> {
    let mut config = Config::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    if let Some(name) = &cli.report_name {
        config.report.file_name = name.clone();
    }
    if cli.no_report {
        config.report.enabled = false;
    }
    config
        .validate()
        .map_err(|e| format!("Error in configuration: {}", e))?;

    run_with_config(&cli.directory, &config, cli.dry_run)
}

/// Organizes `target` and writes the report.
///
/// # Errors
///
/// Returns an error, before any file is touched, when the filters do not
/// compile or the target is missing, not a directory, or cannot be listed.
/// File-level failures and report failures do not make the run fail; they
/// are printed and recorded in the returned [`RunSummary`].
pub fn run_with_config(
    target: &Path,
    config: &Config,
    dry_run: bool,
) -> Result<RunSummary, String> {
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let organizer = FileOrganizer::new(target)
        .with_prefix_length(config.organizer.prefix_length)
        .with_filters(filters)
        .with_dry_run(dry_run);

    if dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", target.display()));
    } else {
        OutputFormatter::info(&format!("Organizing contents of: {}", target.display()));
    }

    let log = organizer.organize().map_err(|e| format!("Error: {}", e))?;

    OutputFormatter::entries(&log);
    OutputFormatter::header("--- File Processing Complete ---");
    OutputFormatter::summary_table(&log);

    if log.error_count() > 0 {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    }

    if dry_run {
        println!();
        OutputFormatter::dry_run_notice("No files were modified and no report was written.");
        return Ok(RunSummary {
            log,
            report: ReportOutcome::NotRequested,
        });
    }

    let report = if config.report.enabled {
        write_report(&log, target, config)
    } else {
        ReportOutcome::NotRequested
    };

    println!();
    match &report {
        ReportOutcome::Written(stats) => OutputFormatter::success(&format!(
            "File organization process finished. Report generated at {}",
            stats.path.display()
        )),
        _ => OutputFormatter::success("File organization process finished."),
    }

    Ok(RunSummary { log, report })
}

fn write_report(log: &ActivityLog, target: &Path, config: &Config) -> ReportOutcome {
    let path = target.join(&config.report.file_name);
    let writer = ReportWriter::new(config.report.layout.clone());

    match writer.write(log, &path) {
        Ok(stats) => {
            OutputFormatter::success(&format!(
                "PDF report generated successfully at {} ({} {})",
                stats.path.display(),
                stats.pages,
                if stats.pages == 1 { "page" } else { "pages" }
            ));
            ReportOutcome::Written(stats)
        }
        Err(e) => {
            let message = format!("Error generating PDF report: {}", e);
            OutputFormatter::error(&message);
            ReportOutcome::Failed(message)
        }
    }
}
