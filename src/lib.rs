//! prefixsort - group files into subdirectories by filename prefix
//!
//! This library scans a single directory, moves every regular file into a
//! subdirectory named after the upper-cased first four characters of its
//! name, and renders the resulting activity log into a paginated PDF report.

pub mod activity_log;
pub mod cli;
pub mod config;
pub mod logging;
pub mod organizer;
pub mod output;
pub mod report;

pub use activity_log::{ActivityLog, LogEntry, SkipReason};
pub use config::{CompiledFilters, Config, ConfigError};
pub use organizer::{FileOrganizer, OrganizeError, prefix_dir_name};
pub use report::{ReportError, ReportLayout, ReportWriter};

pub use cli::{Cli, ReportOutcome, RunSummary, run_cli, run_with_config};
