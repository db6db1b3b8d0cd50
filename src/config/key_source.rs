//! Decryption key lookup
//!
//! The key is read from a named variable. A value already present in the
//! process environment wins; otherwise the `.env` file next to the program is
//! consulted. The file is parsed with dotenvy without touching the process
//! environment, so the key only ever exists as the returned value.

use std::path::PathBuf;

use log::debug;

use crate::crypto::DecryptionKey;
use crate::error::{RestoreError, RestoreResult};

/// Variable holding the backup key unless configured otherwise
pub const DEFAULT_KEY_VARIABLE: &str = "BACKUP_ENCRYPTION_KEY";

/// Resolves the decryption key from process configuration
#[derive(Debug, Clone)]
pub struct KeySource {
    variable: String,
    env_file: PathBuf,
    use_process_env: bool,
}

impl KeySource {
    /// Create a key source reading `BACKUP_ENCRYPTION_KEY` from the environment and `env_file`
    pub fn new(env_file: impl Into<PathBuf>) -> Self {
        Self {
            variable: DEFAULT_KEY_VARIABLE.to_string(),
            env_file: env_file.into(),
            use_process_env: true,
        }
    }

    /// Read a different variable name
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }

    /// Only consult the env file, ignoring the process environment
    pub fn file_only(mut self) -> Self {
        self.use_process_env = false;
        self
    }

    /// Resolve the key
    ///
    /// # Errors
    ///
    /// `MissingKey` if the variable is absent or blank in both places,
    /// `Config` if the env file exists but cannot be parsed.
    pub fn get_key(&self) -> RestoreResult<DecryptionKey> {
        if self.use_process_env {
            if let Some(value) = non_blank(std::env::var(&self.variable).ok()) {
                debug!("Using {} from the process environment", self.variable);
                return Ok(DecryptionKey::from(value));
            }
        }

        if let Some(value) = non_blank(self.read_env_file()?) {
            debug!("Using {} from {}", self.variable, self.env_file.display());
            return Ok(DecryptionKey::from(value));
        }

        Err(RestoreError::MissingKey {
            variable: self.variable.clone(),
            env_file: self.env_file.clone(),
        })
    }

    /// Look the variable up in the env file; a missing file yields `None`
    fn read_env_file(&self) -> RestoreResult<Option<String>> {
        let entries = match dotenvy::from_path_iter(&self.env_file) {
            Ok(entries) => entries,
            Err(e) if e.not_found() => {
                debug!("No env file at {}", self.env_file.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(RestoreError::Config(format!(
                    "Failed to read {}: {}",
                    self.env_file.display(),
                    e
                )))
            }
        };

        let mut found = None;
        for entry in entries {
            let (name, value) = entry.map_err(|e| {
                RestoreError::Config(format!(
                    "Failed to parse {}: {}",
                    self.env_file.display(),
                    e
                ))
            })?;
            // Later assignments override earlier ones
            if name == self.variable {
                found = Some(value);
            }
        }

        Ok(found)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
