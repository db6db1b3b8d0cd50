//! Path management for restore-util
//!
//! Everything the tool touches lives next to the program by default:
//!
//! ```text
//! <base>/.env                          key configuration
//! <base>/backups/*.sql.enc             encrypted backups
//! <base>/backups/restored_script.sql   restored output
//! ```
//!
//! ## Path Resolution Order
//!
//! 1. `--base-dir` flag or `RESTORE_UTIL_BASE_DIR` environment variable
//! 2. The directory containing the running executable
//!
//! The backups directory, env file and output file can each be overridden.

use std::path::{Path, PathBuf};

use crate::error::{RestoreError, RestoreResult};

/// Environment variable that overrides the base directory
pub const BASE_DIR_ENV: &str = "RESTORE_UTIL_BASE_DIR";

/// Name of the backups directory under the base directory
pub const BACKUPS_DIR_NAME: &str = "backups";

/// Name of the key configuration file under the base directory
pub const ENV_FILE_NAME: &str = ".env";

/// Name of the restored script written into the backups directory
pub const OUTPUT_FILE_NAME: &str = "restored_script.sql";

/// Manages all paths used by restore-util
#[derive(Debug, Clone)]
pub struct RestorePaths {
    base_dir: PathBuf,
    backups_dir: Option<PathBuf>,
    env_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

impl RestorePaths {
    /// Create paths rooted at the directory holding the running executable
    ///
    /// # Errors
    ///
    /// Returns an error if the executable's location cannot be determined.
    pub fn new() -> RestoreResult<Self> {
        let exe = std::env::current_exe().map_err(|e| {
            RestoreError::Config(format!("Could not locate the running executable: {}", e))
        })?;
        let base_dir = exe.parent().map(Path::to_path_buf).ok_or_else(|| {
            RestoreError::Config(format!("Executable has no parent directory: {}", exe.display()))
        })?;

        Ok(Self::with_base_dir(base_dir))
    }

    /// Create paths with a custom base directory
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            backups_dir: None,
            env_file: None,
            output_file: None,
        }
    }

    /// Override the backups directory
    pub fn with_backups_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backups_dir = Some(dir.into());
        self
    }

    /// Override the key configuration file
    pub fn with_env_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.env_file = Some(file.into());
        self
    }

    /// Override the restored output file
    pub fn with_output_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.output_file = Some(file.into());
        self
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the backups directory (<base>/backups unless overridden)
    pub fn backups_dir(&self) -> PathBuf {
        self.backups_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join(BACKUPS_DIR_NAME))
    }

    /// Get the key configuration file (<base>/.env unless overridden)
    pub fn env_file(&self) -> PathBuf {
        self.env_file
            .clone()
            .unwrap_or_else(|| self.base_dir.join(ENV_FILE_NAME))
    }

    /// Get the restored output file (<backups>/restored_script.sql unless overridden)
    pub fn output_file(&self) -> PathBuf {
        self.output_file
            .clone()
            .unwrap_or_else(|| self.backups_dir().join(OUTPUT_FILE_NAME))
    }
}
