//! Backup discovery and restoration for restore-util
//!
//! # Architecture
//!
//! The backup system consists of two main components:
//!
//! - `BackupCatalog`: Finds `*.sql.enc` files and orders them by age
//! - `Decryptor`: Decrypts a chosen backup and writes the plaintext script
//!
//! # Example
//!
//! ```rust,ignore
//! use restore_util::backup::{BackupCatalog, Decryptor};
//! use restore_util::config::{KeySource, RestorePaths};
//!
//! let paths = RestorePaths::new()?;
//! let key = KeySource::new(paths.env_file()).get_key()?;
//! let catalog = BackupCatalog::scan(&paths.backups_dir())?;
//!
//! let latest = catalog.latest().expect("scan never returns an empty catalog");
//! let artifact = Decryptor::new(&key).restore(latest, &paths.output_file())?;
//! println!("{}", artifact.summary());
//! ```

mod catalog;
mod restore;

pub use catalog::{BackupCatalog, BackupFile, BACKUP_SUFFIX};
pub use restore::{Decryptor, RestoredArtifact};
