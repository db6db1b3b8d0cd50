//! Backup catalog display formatting
//!
//! Formats the selection menu and the `--list` table.

use crate::backup::BackupCatalog;

/// Width of the banner and separator rules
pub const RULE_WIDTH: usize = 60;

/// Format the numbered selection menu, ending with the question
///
/// Entries are numbered from 1; the newest backup is listed last.
pub fn format_backup_menu(catalog: &BackupCatalog) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\nBackups found in '{}':\n\n",
        catalog.directory().display()
    ));

    for (i, backup) in catalog.iter().enumerate() {
        output.push_str(&format!("   [{}] {}\n", i + 1, backup.filename));
    }

    output.push('\n');
    output.push_str(&"-".repeat(RULE_WIDTH));
    output.push('\n');
    output.push_str(&format!(
        "Select the number of the backup to restore (1-{}): ",
        catalog.len()
    ));
    output
}

/// Format the catalog as a table with modification time and size
pub fn format_backup_list(catalog: &BackupCatalog) -> String {
    let name_width = catalog
        .iter()
        .map(|b| b.filename.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>3}  {:<name_width$}  {:<19}  {:>9}\n",
        "#",
        "File",
        "Modified (UTC)",
        "Size",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:->3}  {:-<name_width$}  {:-<19}  {:->9}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for (i, backup) in catalog.iter().enumerate() {
        output.push_str(&format!(
            "{:>3}  {:<name_width$}  {:<19}  {:>9}\n",
            i + 1,
            backup.filename,
            backup.modified_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            format_size(backup.size_bytes),
            name_width = name_width,
        ));
    }

    output.push_str(&format!("\nTotal: {} backup(s)\n", catalog.len()));
    output
}

/// Format a file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
