/// Prefix-based organization of the files in a single directory.
///
/// Every regular file directly inside the target directory is moved into a
/// subdirectory named after the upper-cased first characters of its name.
/// The run is recorded as an [`ActivityLog`].
use crate::activity_log::{ActivityLog, LogEntry, SkipReason};
use crate::config::CompiledFilters;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Errors that can occur during file organization operations.
///
/// `InvalidTarget` and `ListFailed` abort the whole run. The other variants
/// concern a single file and end up as error entries in the log.
#[derive(Debug)]
pub enum OrganizeError {
    /// The target path does not exist or is not a directory.
    InvalidTarget { path: PathBuf, reason: String },
    /// The target directory could not be listed.
    ListFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The type of a directory entry could not be determined.
    EntryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Something other than a directory already occupies the prefix path.
    PrefixPathOccupied { path: PathBuf },
    /// Failed to create a prefix directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move a file to its prefix directory.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTarget { path, reason } => {
                write!(f, "The directory {} {}", path.display(), reason)
            }
            Self::ListFailed { path, source } => {
                write!(
                    f,
                    "Could not list files in {}: {}. Check permissions.",
                    path.display(),
                    source
                )
            }
            Self::EntryUnreadable { path, source } => {
                write!(f, "Could not read {}: {}", path.display(), source)
            }
            Self::PrefixPathOccupied { path } => {
                write!(f, "{} exists and is not a directory", path.display())
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// What a directory entry turned out to be, with symlinks followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    /// Directories, links to directories, dangling links and special files.
    Other,
    /// The entry could not be inspected; carries the failure text.
    Unreadable(String),
}

/// A directory entry seen during the scan.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Returns the destination directory name for `file_name`: its first
/// `prefix_length` characters, upper-cased.
///
/// The prefix must come from the part of the name before the extension, so
/// `None` is returned when that part is shorter than `prefix_length`.
///
/// # Examples
///
/// ```
/// use prefixsort::organizer::prefix_dir_name;
///
/// assert_eq!(prefix_dir_name("abcd2.txt", 4), Some("ABCD".to_string()));
/// assert_eq!(prefix_dir_name("xy.txt", 4), None);
/// assert_eq!(prefix_dir_name("xyz", 4), None);
/// ```
pub fn prefix_dir_name(file_name: &str, prefix_length: usize) -> Option<String> {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let prefix: String = stem.chars().take(prefix_length).collect();
    if prefix.chars().count() < prefix_length {
        return None;
    }
    Some(prefix.to_uppercase())
}

/// Organizes the files of one target directory.
pub struct FileOrganizer {
    base_path: PathBuf,
    prefix_length: usize,
    filters: CompiledFilters,
    dry_run: bool,
}

impl FileOrganizer {
    /// Creates an organizer for `base_path` with 4-character prefixes and no filters.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            prefix_length: 4,
            filters: CompiledFilters::default(),
            dry_run: false,
        }
    }

    pub fn with_prefix_length(mut self, prefix_length: usize) -> Self {
        self.prefix_length = prefix_length;
        self
    }

    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    /// In a dry run the filesystem is only read, and the log describes
    /// what would have happened.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Fails unless the target exists and is a directory.
    pub fn validate_target(&self) -> OrganizeResult<()> {
        if !self.base_path.exists() {
            return Err(OrganizeError::InvalidTarget {
                path: self.base_path.clone(),
                reason: "does not exist".to_string(),
            });
        }
        if !self.base_path.is_dir() {
            return Err(OrganizeError::InvalidTarget {
                path: self.base_path.clone(),
                reason: "is not a directory".to_string(),
            });
        }
        Ok(())
    }

    /// Lists the immediate children of the target, sorted by name.
    ///
    /// Symlinks are classified by what they point to, so a link to a regular
    /// file is a file. A dangling link is not.
    pub fn scan(&self) -> OrganizeResult<Vec<FileRecord>> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| OrganizeError::ListFailed {
            path: self.base_path.clone(),
            source: e,
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| OrganizeError::ListFailed {
                path: self.base_path.clone(),
                source: e,
            })?;
            let path = entry.path();
            let kind = match fs::metadata(&path) {
                Ok(metadata) if metadata.is_file() => EntryKind::File,
                Ok(_) => EntryKind::Other,
                Err(e)
                    if e.kind() == ErrorKind::NotFound
                        && entry.file_type().is_ok_and(|t| t.is_symlink()) =>
                {
                    EntryKind::Other
                }
                Err(e) => EntryKind::Unreadable(
                    OrganizeError::EntryUnreadable {
                        path: path.clone(),
                        source: e,
                    }
                    .to_string(),
                ),
            };
            records.push(FileRecord {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                kind,
            });
        }

        records.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!(
            path = %self.base_path.display(),
            entries = records.len(),
            "target scanned"
        );
        Ok(records)
    }

    /// Runs the organization and returns the log of everything it did.
    ///
    /// # Errors
    ///
    /// Only run-level failures are returned: an invalid target or a listing
    /// failure, both detected before any file is touched. Failures for a
    /// single file are recorded in the log and processing continues.
    pub fn organize(&self) -> OrganizeResult<ActivityLog> {
        self.validate_target()?;
        let records = self.scan()?;

        let mut log = ActivityLog::new();
        let mut planned_dirs = HashSet::new();

        for record in &records {
            match &record.kind {
                EntryKind::File => self.process_file(record, &mut log, &mut planned_dirs),
                EntryKind::Unreadable(reason) => log.push(LogEntry::Failed {
                    file_name: record.name.clone(),
                    reason: reason.clone(),
                }),
                EntryKind::Other => {}
            }
        }

        Ok(log)
    }

    fn process_file(
        &self,
        record: &FileRecord,
        log: &mut ActivityLog,
        planned_dirs: &mut HashSet<PathBuf>,
    ) {
        let Some(prefix) = prefix_dir_name(&record.name, self.prefix_length) else {
            log.push(LogEntry::Skipped {
                file_name: record.name.clone(),
                reason: SkipReason::TooShort {
                    min: self.prefix_length,
                },
            });
            return;
        };

        if self.filters.is_excluded(&record.name) {
            log.push(LogEntry::Skipped {
                file_name: record.name.clone(),
                reason: SkipReason::Excluded,
            });
            return;
        }

        if self.dry_run {
            let prefix_path = self.base_path.join(&prefix);
            let exists = match prefix_dir_exists(&prefix_path) {
                Ok(exists) => exists,
                Err(error) => {
                    log.push(LogEntry::Failed {
                        file_name: record.name.clone(),
                        reason: error.to_string(),
                    });
                    return;
                }
            };
            if !exists && planned_dirs.insert(prefix_path.clone()) {
                log.push(LogEntry::WouldCreate { path: prefix_path });
            }
            log.push(LogEntry::WouldMove {
                file_name: record.name.clone(),
                prefix,
            });
            return;
        }

        match self.move_to_prefix_dir(&record.path, &prefix) {
            Ok(created) => {
                if let Some(path) = created {
                    log.push(LogEntry::DirectoryCreated { path });
                }
                log.push(LogEntry::Moved {
                    file_name: record.name.clone(),
                    prefix,
                });
            }
            Err((created, error)) => {
                if let Some(path) = created {
                    log.push(LogEntry::DirectoryCreated { path });
                }
                log.push(LogEntry::Failed {
                    file_name: record.name.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }

    /// Moves `file_path` into `<base>/<prefix>/`, replacing a file of the
    /// same name there.
    ///
    /// Returns the prefix directory if this call created it. On failure the
    /// created directory (if any) is returned alongside the error so the
    /// log still records it.
    fn move_to_prefix_dir(
        &self,
        file_path: &Path,
        prefix: &str,
    ) -> Result<Option<PathBuf>, (Option<PathBuf>, OrganizeError)> {
        let prefix_path = self.base_path.join(prefix);

        let mut created = None;
        if !prefix_dir_exists(&prefix_path).map_err(|e| (None, e))? {
            fs::create_dir_all(&prefix_path).map_err(|e| {
                (
                    None,
                    OrganizeError::DirectoryCreationFailed {
                        path: prefix_path.clone(),
                        source: e,
                    },
                )
            })?;
            created = Some(prefix_path.clone());
        }

        let Some(file_name) = file_path.file_name() else {
            return Err((
                created,
                OrganizeError::FileMoveFailure {
                    source: file_path.to_path_buf(),
                    destination: prefix_path,
                    source_error: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "file has no name component",
                    ),
                },
            ));
        };
        let destination = prefix_path.join(file_name);

        // rename replaces an existing destination file on all supported platforms
        if let Err(e) = fs::rename(file_path, &destination) {
            return Err((
                created,
                OrganizeError::FileMoveFailure {
                    source: file_path.to_path_buf(),
                    destination,
                    source_error: e,
                },
            ));
        }

        Ok(created)
    }
}

/// Whether the prefix directory is already there. A file or other
/// non-directory at that path is an error for the file being processed.
fn prefix_dir_exists(prefix_path: &Path) -> OrganizeResult<bool> {
    if prefix_path.is_dir() {
        Ok(true)
    } else if prefix_path.exists() {
        Err(OrganizeError::PrefixPathOccupied {
            path: prefix_path.to_path_buf(),
        })
    } else {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[test]
    fn test_prefix_dir_name_uppercases() {
        assert_eq!(prefix_dir_name("ABCD1.txt", 4).as_deref(), Some("ABCD"));
        assert_eq!(prefix_dir_name("abcd2.txt", 4).as_deref(), Some("ABCD"));
        assert_eq!(prefix_dir_name("abcd", 4).as_deref(), Some("ABCD"));
    }

    #[test]
    fn test_prefix_dir_name_counts_characters() {
        assert_eq!(prefix_dir_name("añob.txt", 4).as_deref(), Some("AÑOB"));
        assert_eq!(prefix_dir_name("año", 4), None);
        assert_eq!(prefix_dir_name("xy.txt", 4), None);
        assert_eq!(prefix_dir_name(".bashrc", 4).as_deref(), Some(".BAS"));
        assert_eq!(prefix_dir_name("", 4), None);
        assert_eq!(prefix_dir_name("ab.txt", 2).as_deref(), Some("AB"));
    }

    #[test]
    fn test_prefix_dir_name_ignores_extension_characters() {
        // Long enough overall, but the stem is short.
        assert_eq!(prefix_dir_name("ab.c", 4), None);
        assert_eq!(prefix_dir_name("a.bcdef", 4), None);
        assert_eq!(prefix_dir_name("abcd.e", 4).as_deref(), Some("ABCD"));
        assert_eq!(prefix_dir_name("ab.cd.txt", 4).as_deref(), Some("AB.C"));
    }

    #[test]
    fn test_organize_moves_and_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("ABCD1.txt"), "one").expect("Failed to write file");
        fs::write(base_path.join("abcd2.txt"), "two").expect("Failed to write file");

        let log = FileOrganizer::new(base_path)
            .organize()
            .expect("Organize failed");

        assert!(base_path.join("ABCD").join("ABCD1.txt").exists());
        assert!(base_path.join("ABCD").join("abcd2.txt").exists());
        assert!(!base_path.join("ABCD1.txt").exists());

        assert_eq!(
            log.entries(),
            &[
                LogEntry::DirectoryCreated {
                    path: base_path.join("ABCD")
                },
                LogEntry::Moved {
                    file_name: "ABCD1.txt".to_string(),
                    prefix: "ABCD".to_string()
                },
                LogEntry::Moved {
                    file_name: "abcd2.txt".to_string(),
                    prefix: "ABCD".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_short_name_is_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("xyz"), "short").expect("Failed to write file");

        let log = FileOrganizer::new(base_path)
            .organize()
            .expect("Organize failed");

        assert!(base_path.join("xyz").exists());
        assert_eq!(log.skipped_count(), 1);
        assert_eq!(
            log.entries()[0],
            LogEntry::Skipped {
                file_name: "xyz".to_string(),
                reason: SkipReason::TooShort { min: 4 }
            }
        );
    }

    #[test]
    fn test_subdirectories_are_ignored() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::create_dir(base_path.join("nested_dir")).expect("Failed to create dir");
        fs::write(base_path.join("nested_dir").join("inner.txt"), "x")
            .expect("Failed to write file");

        let log = FileOrganizer::new(base_path)
            .organize()
            .expect("Organize failed");

        assert!(log.is_empty());
        assert!(base_path.join("nested_dir").join("inner.txt").exists());
        assert!(!base_path.join("NEST").exists());
    }

    #[test]
    fn test_existing_destination_is_overwritten() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::create_dir(base_path.join("ABCD")).expect("Failed to create dir");
        fs::write(base_path.join("ABCD").join("ABCD1.txt"), "old").expect("Failed to write");
        fs::write(base_path.join("ABCD1.txt"), "new").expect("Failed to write");

        let log = FileOrganizer::new(base_path)
            .organize()
            .expect("Organize failed");

        let content =
            fs::read_to_string(base_path.join("ABCD").join("ABCD1.txt")).expect("Failed to read");
        assert_eq!(content, "new");
        assert_eq!(log.len(), 1);
        assert!(matches!(log.entries()[0], LogEntry::Moved { .. }));
    }

    #[test]
    fn test_move_failure_is_recorded_and_batch_continues() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        // A directory sits where the file would land, so the rename fails.
        fs::create_dir_all(base_path.join("BLOC").join("blocked.txt"))
            .expect("Failed to create dir");
        fs::write(base_path.join("blocked.txt"), "x").expect("Failed to write");
        fs::write(base_path.join("fine.txt"), "y").expect("Failed to write");

        let log = FileOrganizer::new(base_path)
            .organize()
            .expect("Organize failed");

        assert_eq!(log.error_count(), 1);
        assert!(base_path.join("blocked.txt").exists());
        assert!(base_path.join("FINE").join("fine.txt").exists());
        assert!(matches!(
            &log.entries()[0],
            LogEntry::Failed { file_name, .. } if file_name == "blocked.txt"
        ));
    }

    #[test]
    fn test_excluded_file_is_logged_and_left() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("notes.bak"), "x").expect("Failed to write");

        let config = Config::from_toml_str("[filters.exclude]\nextensions = [\"bak\"]\n")
            .expect("Invalid config");
        let log = FileOrganizer::new(base_path)
            .with_filters(config.compile_filters().expect("Invalid filters"))
            .organize()
            .expect("Organize failed");

        assert!(base_path.join("notes.bak").exists());
        assert_eq!(
            log.entries(),
            &[LogEntry::Skipped {
                file_name: "notes.bak".to_string(),
                reason: SkipReason::Excluded
            }]
        );
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("abcd1.txt"), "x").expect("Failed to write");
        fs::write(base_path.join("abcd2.txt"), "y").expect("Failed to write");

        let log = FileOrganizer::new(base_path)
            .with_dry_run(true)
            .organize()
            .expect("Organize failed");

        assert!(base_path.join("abcd1.txt").exists());
        assert!(!base_path.join("ABCD").exists());
        let creates = log
            .entries()
            .iter()
            .filter(|e| matches!(e, LogEntry::WouldCreate { .. }))
            .count();
        assert_eq!(creates, 1);
        assert_eq!(log.moves_by_prefix().get("ABCD"), Some(&2));
    }

    #[test]
    fn test_file_at_prefix_path_fails_in_dry_run_and_real_run() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("ABCD"), "not a directory").expect("Failed to write");
        fs::write(base_path.join("abcd1.txt"), "x").expect("Failed to write");

        let planned = FileOrganizer::new(base_path)
            .with_dry_run(true)
            .organize()
            .expect("Organize failed");
        let actual = FileOrganizer::new(base_path)
            .organize()
            .expect("Organize failed");

        let occupied = format!(
            "{} exists and is not a directory",
            base_path.join("ABCD").display()
        );
        let expected = [
            LogEntry::Failed {
                file_name: "ABCD".to_string(),
                reason: occupied.clone(),
            },
            LogEntry::Failed {
                file_name: "abcd1.txt".to_string(),
                reason: occupied,
            },
        ];
        assert_eq!(planned.entries(), &expected);
        assert_eq!(actual.entries(), &expected);
        assert!(base_path.join("ABCD").is_file());
        assert!(base_path.join("abcd1.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_file_is_moved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let outside = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let real_file = outside.path().join("real.txt");
        fs::write(&real_file, "content").expect("Failed to write");
        std::os::unix::fs::symlink(&real_file, base_path.join("linkfile.txt"))
            .expect("Failed to create symlink");

        let log = FileOrganizer::new(base_path)
            .organize()
            .expect("Organize failed");

        assert_eq!(
            log.entries(),
            &[
                LogEntry::DirectoryCreated {
                    path: base_path.join("LINK")
                },
                LogEntry::Moved {
                    file_name: "linkfile.txt".to_string(),
                    prefix: "LINK".to_string()
                },
            ]
        );
        let moved = base_path.join("LINK").join("linkfile.txt");
        let metadata = fs::symlink_metadata(&moved).expect("Link was not moved");
        assert!(metadata.file_type().is_symlink());
        assert_eq!(fs::read_to_string(&moved).expect("Failed to read"), "content");
        assert!(real_file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_to_directories_and_dangling_links_are_ignored() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let outside = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        std::os::unix::fs::symlink(outside.path(), base_path.join("linkdir"))
            .expect("Failed to create symlink");
        let missing = outside.path().join("gone.txt");
        std::os::unix::fs::symlink(&missing, base_path.join("dangling.txt"))
            .expect("Failed to create symlink");

        let log = FileOrganizer::new(base_path)
            .organize()
            .expect("Organize failed");

        assert!(log.is_empty());
        assert!(!base_path.join("LINK").exists());
        assert!(!base_path.join("DANG").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_target_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).expect("Failed to create dir");
        fs::write(locked.join("abcd1.txt"), "x").expect("Failed to write");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))
            .expect("Failed to set permissions");

        // Privileged users can still list the directory.
        let result = fs::read_dir(&locked)
            .is_err()
            .then(|| FileOrganizer::new(&locked).organize());

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))
            .expect("Failed to restore permissions");
        let Some(result) = result else {
            return;
        };

        assert!(matches!(result, Err(OrganizeError::ListFailed { .. })));
        assert!(locked.join("abcd1.txt").exists());
        assert!(!locked.join("ABCD").exists());
    }

    #[test]
    fn test_invalid_target() {
        let result = FileOrganizer::new("/non/existent/path").organize();
        assert!(matches!(result, Err(OrganizeError::InvalidTarget { .. })));

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("plain.txt");
        fs::write(&file_path, "x").expect("Failed to write");
        let result = FileOrganizer::new(&file_path).organize();
        assert!(matches!(result, Err(OrganizeError::InvalidTarget { .. })));
    }
}
