//! CLI workflow
//!
//! This module bridges the clap argument parsing in `main.rs` with the
//! backup, config and crypto layers.

pub mod prompt;
pub mod restore;

pub use prompt::{ConsoleInput, InputSource, ScriptedInput, SelectionPrompt};
pub use restore::{list_backups, report_failure, report_success, Orchestrator};
