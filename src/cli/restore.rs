//! Restore workflow
//!
//! Runs key lookup, backup scan, selection and decryption strictly in order.
//! The first failure stops the run; nothing is retried.

use std::io::{self, Write};

use log::info;

use crate::backup::{BackupCatalog, Decryptor, RestoredArtifact};
use crate::config::{KeySource, RestorePaths};
use crate::display::{format_backup_list, RULE_WIDTH};
use crate::error::{RestoreError, RestoreResult};

use super::prompt::{InputSource, SelectionPrompt};

/// Sequences the restore stages and reports the outcome
pub struct Orchestrator<I: InputSource> {
    paths: RestorePaths,
    key_source: KeySource,
    prompt: SelectionPrompt<I>,
}

impl<I: InputSource> Orchestrator<I> {
    /// Create a new Orchestrator
    pub fn new(paths: RestorePaths, key_source: KeySource, input: I) -> Self {
        Self {
            paths,
            key_source,
            prompt: SelectionPrompt::new(input),
        }
    }

    /// Run the whole workflow, writing status to `out`
    ///
    /// Returns the restored artifact, or the error of the first stage that
    /// failed. Use [`report_failure`] to show that error to the operator.
    pub fn run<W: Write>(&mut self, out: &mut W) -> RestoreResult<RestoredArtifact> {
        write_banner(out)?;

        let key = self.key_source.get_key()?;

        let catalog = BackupCatalog::scan(&self.paths.backups_dir())?;
        info!(
            "{} backup(s) available in {}",
            catalog.len(),
            catalog.directory().display()
        );

        let index = self.prompt.choose(&catalog)?;
        let backup = catalog
            .get(index)
            .ok_or_else(|| RestoreError::OutOfRange {
                selection: index as i64 + 1,
                max: catalog.len(),
            })?;

        writeln!(out)?;
        writeln!(out, "Processing: {}...", backup.filename)?;

        let output_path = self.paths.output_file();
        let artifact = Decryptor::new(&key).restore(backup, &output_path)?;
        info!("{}", artifact.summary());

        report_success(&artifact, out)?;
        Ok(artifact)
    }

    /// Run the workflow and report any failure; returns the process exit code
    pub fn execute<W: Write>(&mut self, out: &mut W) -> io::Result<u8> {
        match self.run(out) {
            Ok(_) => Ok(0),
            Err(err) => {
                report_failure(&err, out)?;
                Ok(err.exit_code())
            }
        }
    }

    /// Give back the selection input source
    pub fn into_input(self) -> I {
        self.prompt.into_inner()
    }
}

/// Print the catalog without asking for a key or a selection
pub fn list_backups<W: Write>(paths: &RestorePaths, out: &mut W) -> RestoreResult<()> {
    let catalog = BackupCatalog::scan(&paths.backups_dir())?;

    writeln!(out, "Backups in {}", catalog.directory().display())?;
    writeln!(out)?;
    write!(out, "{}", format_backup_list(&catalog))?;
    if let Some(latest) = catalog.latest() {
        writeln!(out, "Most recent: {}", latest.filename)?;
    }
    Ok(())
}

fn write_banner<W: Write>(out: &mut W) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "{}", rule)?;
    writeln!(out, " DATABASE BACKUP RESTORE UTILITY")?;
    writeln!(out, "{}", rule)
}

/// Print the success report with the sensitivity reminder
pub fn report_success<W: Write>(artifact: &RestoredArtifact, out: &mut W) -> io::Result<()> {
    let filename = artifact
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| artifact.path.display().to_string());

    writeln!(out)?;
    writeln!(out, "SUCCESS! Backup decrypted.")?;
    writeln!(out, "Output file: {}", artifact.path.display())?;
    writeln!(
        out,
        "You can now open this file in a database administration tool and run it manually."
    )?;
    writeln!(
        out,
        "IMPORTANT: the file contains plaintext data. Delete '{}' when you are done.",
        filename
    )
}

/// Print a stage-specific diagnostic for a failed run
pub fn report_failure<W: Write>(err: &RestoreError, out: &mut W) -> io::Result<()> {
    match err {
        RestoreError::MissingKey { variable, env_file } => writeln!(
            out,
            "CRITICAL ERROR: {} was not found in the environment or in {}",
            variable,
            env_file.display()
        )?,
        RestoreError::DirectoryNotFound(dir) => writeln!(
            out,
            "The backup directory does not exist:\n   {}",
            dir.display()
        )?,
        RestoreError::NoBackupsFound(dir) => {
            writeln!(out, "No .sql.enc files found in:\n   {}", dir.display())?
        }
        RestoreError::InvalidInput(raw) => {
            writeln!(out, "'{}' is not a number. Please enter a valid number.", raw)?
        }
        RestoreError::OutOfRange { selection, max } => writeln!(
            out,
            "Invalid selection: {} is not between 1 and {}.",
            selection, max
        )?,
        RestoreError::Decryption { filename, cause } => {
            writeln!(out)?;
            writeln!(out, "Error while decrypting {}: {}", filename, cause)?
        }
        RestoreError::Io(_) | RestoreError::Config(_) => {
            writeln!(out, "Error during {}: {}", err.stage(), err)?
        }
    }

    if let Some(hint) = err.hint() {
        writeln!(out, "{}", hint)?;
    }
    Ok(())
}
