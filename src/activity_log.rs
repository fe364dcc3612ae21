/// Ordered record of everything that happened during an organization run.
///
/// The organizer appends one [`LogEntry`] per event and hands the finished
/// [`ActivityLog`] to the report writer, which renders the entries in the
/// order they were produced.
use std::collections::BTreeMap;
use std::fmt;
use std::path::{MAIN_SEPARATOR, PathBuf};

/// Why a file was left where it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The name before the extension is shorter than the prefix length.
    TooShort { min: usize },
    /// The file matched one of the configured exclusion rules.
    Excluded,
}

/// A single event of an organization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// A prefix subdirectory was created.
    DirectoryCreated { path: PathBuf },
    /// A file was moved into its prefix subdirectory.
    Moved { file_name: String, prefix: String },
    /// A file was not touched.
    Skipped { file_name: String, reason: SkipReason },
    /// Creating the destination or moving the file failed.
    Failed { file_name: String, reason: String },
    /// Dry run: a prefix subdirectory would be created.
    WouldCreate { path: PathBuf },
    /// Dry run: a file would be moved.
    WouldMove { file_name: String, prefix: String },
}

impl LogEntry {
    /// Returns true for entries that should also go to stderr.
    pub fn is_error(&self) -> bool {
        matches!(self, LogEntry::Failed { .. })
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::DirectoryCreated { path } => {
                write!(f, "Created directory: {}", path.display())
            }
            LogEntry::Moved { file_name, prefix } => write!(
                f,
                "Moved file: {} to {}{}{}",
                file_name, prefix, MAIN_SEPARATOR, file_name
            ),
            LogEntry::Skipped {
                file_name,
                reason: SkipReason::TooShort { min },
            } => write!(
                f,
                "File name {} has less than {} characters before its extension. Skipping.",
                file_name, min
            ),
            LogEntry::Skipped {
                file_name,
                reason: SkipReason::Excluded,
            } => write!(f, "File {} matches an exclusion rule. Skipping.", file_name),
            LogEntry::Failed { file_name, reason } => {
                write!(f, "Error processing file {}: {}", file_name, reason)
            }
            LogEntry::WouldCreate { path } => {
                write!(f, "[DRY RUN] Would create directory: {}", path.display())
            }
            LogEntry::WouldMove { file_name, prefix } => write!(
                f,
                "[DRY RUN] Would move file: {} to {}{}{}",
                file_name, prefix, MAIN_SEPARATOR, file_name
            ),
        }
    }
}

/// Append-only sequence of [`LogEntry`] values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and emits it as a diagnostic event.
    pub fn push(&mut self, entry: LogEntry) {
        tracing::debug!(entry = %entry, error = entry.is_error(), "activity recorded");
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The rendered text of every entry, in production order.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Number of error-class entries.
    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_error()).count()
    }

    /// Number of skip entries, whatever the reason.
    pub fn skipped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, LogEntry::Skipped { .. }))
            .count()
    }

    /// Files moved (or planned to be moved) per prefix directory, sorted by prefix.
    pub fn moves_by_prefix(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            if let LogEntry::Moved { prefix, .. } | LogEntry::WouldMove { prefix, .. } = entry {
                *counts.entry(prefix.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}

impl<'a> IntoIterator for &'a ActivityLog {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
