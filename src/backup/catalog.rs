//! Backup discovery
//!
//! Scans a directory (non-recursively) for `*.sql.enc` files and orders them
//! oldest first, so the most recent backup sits at the bottom of the menu.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::error::{RestoreError, RestoreResult};

/// Suffix every encrypted backup carries
pub const BACKUP_SUFFIX: &str = ".sql.enc";

/// Snapshot of one backup file taken at scan time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    /// Full path to the backup
    pub path: PathBuf,
    /// Backup filename
    pub filename: String,
    /// Filesystem modification time
    pub modified_at: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Backups found in one directory, sorted ascending by modification time
#[derive(Debug, Clone)]
pub struct BackupCatalog {
    directory: PathBuf,
    files: Vec<BackupFile>,
}

impl BackupCatalog {
    /// Scan a directory for backups
    ///
    /// # Errors
    ///
    /// `DirectoryNotFound` if `directory` is missing or not a directory,
    /// `NoBackupsFound` if it holds no matching files, `Io` if it cannot be listed.
    pub fn scan(directory: &Path) -> RestoreResult<Self> {
        if !directory.is_dir() {
            return Err(RestoreError::DirectoryNotFound(directory.to_path_buf()));
        }

        debug!("Scanning {} for backups", directory.display());

        let mut files = Vec::new();

        for entry in fs::read_dir(directory).map_err(|e| {
            RestoreError::Io(format!(
                "Failed to read backup directory {}: {}",
                directory.display(),
                e
            ))
        })? {
            let entry = entry.map_err(|e| {
                RestoreError::Io(format!("Failed to read directory entry: {}", e))
            })?;

            let filename = entry.file_name().to_string_lossy().to_string();
            if !is_backup_name(&filename) {
                continue;
            }

            let path = entry.path();
            // fs::metadata follows symlinks
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let modified_at = match metadata.modified() {
                Ok(time) => DateTime::<Utc>::from(time),
                Err(e) => {
                    warn!("Skipping {}: no modification time ({})", path.display(), e);
                    continue;
                }
            };

            files.push(BackupFile {
                path,
                filename,
                modified_at,
                size_bytes: metadata.len(),
            });
        }

        if files.is_empty() {
            return Err(RestoreError::NoBackupsFound(directory.to_path_buf()));
        }

        // Stable: equal timestamps keep enumeration order
        files.sort_by_key(|f| f.modified_at);

        debug!("Found {} backup(s)", files.len());

        Ok(Self {
            directory: directory.to_path_buf(),
            files,
        })
    }

    /// Directory that was scanned
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of backups
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Get a backup by 0-based position
    pub fn get(&self, index: usize) -> Option<&BackupFile> {
        self.files.get(index)
    }

    /// Most recently modified backup
    pub fn latest(&self) -> Option<&BackupFile> {
        self.files.last()
    }

    /// Iterate backups oldest first
    pub fn iter(&self) -> std::slice::Iter<'_, BackupFile> {
        self.files.iter()
    }

}

impl<'a> IntoIterator for &'a BackupCatalog {
    type Item = &'a BackupFile;
    type IntoIter = std::slice::Iter<'a, BackupFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Match `*.sql.enc` the way a shell glob would: hidden files are excluded
fn is_backup_name(filename: &str) -> bool {
    !filename.starts_with('.')
        && filename.len() > BACKUP_SUFFIX.len()
        && filename.ends_with(BACKUP_SUFFIX)
}
