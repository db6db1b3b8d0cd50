//! Custom error types for restore-util
//!
//! Every stage of the restore workflow reports failure through
//! [`RestoreError`]. The binary matches on the variant to print a
//! stage-specific diagnostic and pick an exit code.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a backup could not be decrypted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptFailure {
    /// The configured key is not base64 of 32 bytes
    InvalidKey(String),
    /// The file is not a base64 token, is truncated, or has bad padding
    Malformed,
    /// The token does not start with the Fernet version byte
    UnsupportedVersion(u8),
    /// HMAC verification failed: wrong key or tampered token
    Authentication,
}

impl fmt::Display for DecryptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey(reason) => write!(f, "invalid key: {}", reason),
            Self::Malformed => write!(f, "file is truncated or not an encrypted backup"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported token version 0x{:02x}", v),
            Self::Authentication => write!(f, "authentication failed: invalid key or corrupted data"),
        }
    }
}

/// The main error type for restore operations
#[derive(Error, Debug)]
pub enum RestoreError {
    /// The key variable is absent or empty
    #[error("No {variable} found in the environment or in {}", .env_file.display())]
    MissingKey { variable: String, env_file: PathBuf },

    /// The backups directory does not exist
    #[error("Backup directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The backups directory holds no `*.sql.enc` files
    #[error("No .sql.enc files found in: {}", .0.display())]
    NoBackupsFound(PathBuf),

    /// Operator input was not a number
    #[error("Invalid selection '{0}': please enter a number")]
    InvalidInput(String),

    /// Operator input was a number outside the menu
    #[error("Selection {selection} is out of range (1-{max})")]
    OutOfRange { selection: i64, max: usize },

    /// Authenticated decryption failed
    #[error("Failed to decrypt {filename}: {cause}")]
    Decryption {
        filename: String,
        cause: DecryptFailure,
    },

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RestoreError {
    /// Create a decryption error for the given backup
    pub fn decryption(filename: impl Into<String>, cause: DecryptFailure) -> Self {
        Self::Decryption {
            filename: filename.into(),
            cause,
        }
    }

    /// Check if this is a decryption error
    pub fn is_decryption(&self) -> bool {
        matches!(self, Self::Decryption { .. })
    }

    /// Name of the workflow stage that produced this error
    pub fn stage(&self) -> &'static str {
        match self {
            Self::MissingKey { .. } | Self::Config(_) => "key lookup",
            Self::DirectoryNotFound(_) | Self::NoBackupsFound(_) => "backup scan",
            Self::InvalidInput(_) | Self::OutOfRange { .. } => "selection",
            Self::Decryption { .. } | Self::Io(_) => "decryption",
        }
    }

    /// Most likely remediation for the operator, if there is one
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingKey { .. } => {
                Some("Set the key in the .env file next to this program or export it in your shell.")
            }
            Self::DirectoryNotFound(_) => {
                Some("Create the directory or point --backups-dir at the folder holding your backups.")
            }
            Self::NoBackupsFound(_) => Some("Copy the .sql.enc backup files into this directory."),
            Self::InvalidInput(_) | Self::OutOfRange { .. } => {
                Some("Run the program again and enter one of the listed numbers.")
            }
            Self::Decryption { cause, .. } => match cause {
                DecryptFailure::Authentication => Some(
                    "Likely cause: the key in your configuration does not match the one used to create this backup.",
                ),
                DecryptFailure::InvalidKey(_) => {
                    Some("The key must be a Fernet key: URL-safe base64 of 32 random bytes.")
                }
                DecryptFailure::Malformed | DecryptFailure::UnsupportedVersion(_) => {
                    Some("The file may be damaged or was not produced by the backup job.")
                }
            },
            Self::Io(_) | Self::Config(_) => None,
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io(_) | Self::Config(_) => 1,
            Self::MissingKey { .. } => 2,
            Self::DirectoryNotFound(_) => 3,
            Self::NoBackupsFound(_) => 4,
            Self::InvalidInput(_) => 5,
            Self::OutOfRange { .. } => 6,
            Self::Decryption { .. } => 7,
        }
    }
}

impl From<std::io::Error> for RestoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for restore operations
pub type RestoreResult<T> = Result<T, RestoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RestoreError::Config("bad line".into());
        assert_eq!(err.to_string(), "Configuration error: bad line");
    }

    #[test]
    fn test_out_of_range_display() {
        let err = RestoreError::OutOfRange {
            selection: 9,
            max: 3,
        };
        assert_eq!(err.to_string(), "Selection 9 is out of range (1-3)");
        assert_eq!(err.stage(), "selection");
    }

    #[test]
    fn test_authentication_hint_mentions_key() {
        let err = RestoreError::decryption("a.sql.enc", DecryptFailure::Authentication);
        assert!(err.is_decryption());
        assert!(err.hint().unwrap().contains("does not match"));
        assert_eq!(err.stage(), "decryption");
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            RestoreError::Io("x".into()),
            RestoreError::MissingKey {
                variable: "K".into(),
                env_file: PathBuf::from(".env"),
            },
            RestoreError::DirectoryNotFound(PathBuf::from("b")),
            RestoreError::NoBackupsFound(PathBuf::from("b")),
            RestoreError::InvalidInput("abc".into()),
            RestoreError::OutOfRange {
                selection: 0,
                max: 1,
            },
            RestoreError::decryption("f", DecryptFailure::Malformed),
        ];
        let mut codes: Vec<u8> = errors.iter().map(|e| e.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RestoreError = io_err.into();
        assert!(matches!(err, RestoreError::Io(_)));
    }
}
