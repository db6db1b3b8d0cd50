//! Backup decryption and restoration
//!
//! Reads an encrypted backup, decrypts it in memory and only then writes the
//! plaintext script. The write goes through a temp file and a rename, so the
//! output path never holds a half-written script.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::crypto::{self, DecryptionKey};
use crate::error::{RestoreError, RestoreResult};

use super::catalog::BackupFile;

/// Handles decrypting a backup to a plaintext script
pub struct Decryptor<'k> {
    key: &'k DecryptionKey,
}

impl<'k> Decryptor<'k> {
    /// Create a new Decryptor that uses `key` for every restore
    pub fn new(key: &'k DecryptionKey) -> Self {
        Self { key }
    }

    /// Decrypt `backup` and write the plaintext to `output_path`
    ///
    /// Any existing file at `output_path` is replaced. On failure the output
    /// path is left untouched.
    pub fn restore(&self, backup: &BackupFile, output_path: &Path) -> RestoreResult<RestoredArtifact> {
        debug!("Reading {}", backup.path.display());

        let token = fs::read(&backup.path).map_err(|e| {
            RestoreError::Io(format!(
                "Failed to read backup file {}: {}",
                backup.path.display(),
                e
            ))
        })?;

        let plaintext = crypto::decrypt(&token, self.key).map_err(|cause| {
            warn!("Decryption of {} failed: {}", backup.filename, cause);
            RestoreError::decryption(&backup.filename, cause)
        })?;

        write_atomic(output_path, &plaintext)?;

        Ok(RestoredArtifact {
            path: output_path.to_path_buf(),
            bytes_written: plaintext.len() as u64,
            source: backup.filename.clone(),
        })
    }
}

/// Result of a successful restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredArtifact {
    /// Where the plaintext script was written
    pub path: PathBuf,
    /// Size of the plaintext script
    pub bytes_written: u64,
    /// Filename of the backup it came from
    pub source: String,
}

impl RestoredArtifact {
    /// Get a one-line summary of the restore
    pub fn summary(&self) -> String {
        format!(
            "Restored {} ({} bytes) to {}",
            self.source,
            self.bytes_written,
            self.path.display()
        )
    }
}

/// Write bytes to a file atomically (write to temp, then rename)
fn write_atomic(path: &Path, data: &[u8]) -> RestoreResult<()> {
    let temp_path = temp_path_for(path);

    let file = create_private(&temp_path).map_err(|e| {
        RestoreError::Io(format!(
            "Failed to create temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    let mut writer = BufWriter::new(file);
    let written = writer
        .write_all(data)
        .and_then(|_| writer.flush())
        .and_then(|_| writer.get_ref().sync_all());

    if let Err(e) = written {
        drop(writer);
        let _ = fs::remove_file(&temp_path);
        return Err(RestoreError::Io(format!(
            "Failed to write {}: {}",
            temp_path.display(),
            e
        )));
    }
    drop(writer);

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        RestoreError::Io(format!("Failed to write {}: {}", path.display(), e))
    })?;

    Ok(())
}

/// Create `path` readable and writable by the owner only
///
/// A stale temp file from an interrupted run is removed first so it cannot
/// carry wider permissions over.
fn create_private(path: &Path) -> io::Result<File> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
