//! restore-util - Decrypt encrypted SQL backups for manual restore
//!
//! This library provides the core functionality for the restore-util
//! command. Given a directory of `*.sql.enc` backups and a symmetric key, it
//! lists the backups, lets the operator pick one, decrypts the Fernet
//! token and writes the plaintext script to disk.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and decryption key lookup
//! - `error`: Custom error types
//! - `crypto`: Authenticated decryption and key handling
//! - `backup`: Backup discovery and restoration
//! - `display`: Terminal formatting for the catalog
//! - `cli`: Selection prompt and the restore workflow
//!
//! # Example
//!
//! ```rust,ignore
//! use restore_util::cli::{ConsoleInput, Orchestrator};
//! use restore_util::config::{KeySource, RestorePaths};
//!
//! let paths = RestorePaths::new()?;
//! let key_source = KeySource::new(paths.env_file());
//! let mut orchestrator = Orchestrator::new(paths, key_source, ConsoleInput);
//! let exit_code = orchestrator.execute(&mut std::io::stdout())?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;

pub use error::{RestoreError, RestoreResult};
