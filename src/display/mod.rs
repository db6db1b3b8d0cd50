//! Display formatting for terminal output
//!
//! Provides utilities for formatting the backup catalog for terminal display.

pub mod backup;

pub use backup::{format_backup_list, format_backup_menu, format_size, RULE_WIDTH};
