//! Configuration module for restore-util
//!
//! This module provides:
//! - Path resolution relative to the program's location
//! - Decryption key lookup from the environment and `.env` file

pub mod key_source;
pub mod paths;

pub use key_source::{KeySource, DEFAULT_KEY_VARIABLE};
pub use paths::RestorePaths;
