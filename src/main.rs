use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use restore_util::cli::{list_backups, report_failure, ConsoleInput, Orchestrator, ScriptedInput};
use restore_util::config::{paths::BASE_DIR_ENV, KeySource, RestorePaths, DEFAULT_KEY_VARIABLE};

#[derive(Parser)]
#[command(
    name = "restore-util",
    author = "Kaylee Beyene",
    version,
    about = "Decrypt an encrypted SQL backup for manual restore",
    long_about = "restore-util lists the *.sql.enc backups in the backups directory, \
                  asks which one to restore, decrypts it with the key from your \
                  configuration and writes the plaintext script next to the backups. \
                  The restored script is never executed automatically."
)]
struct Cli {
    /// Directory holding the .env file and the backups folder
    #[arg(long, env = BASE_DIR_ENV, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Directory to scan for *.sql.enc files [default: <base>/backups]
    #[arg(long, value_name = "DIR")]
    backups_dir: Option<PathBuf>,

    /// File to read the key from [default: <base>/.env]
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Where to write the restored script [default: <backups>/restored_script.sql]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Name of the variable holding the decryption key
    #[arg(long, default_value = DEFAULT_KEY_VARIABLE, value_name = "NAME")]
    key_var: String,

    /// Answer the menu with this number instead of prompting
    #[arg(short, long, value_name = "N", conflicts_with = "list")]
    select: Option<String>,

    /// List available backups and exit
    #[arg(short, long)]
    list: bool,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let mut paths = match cli.base_dir {
        Some(base) => RestorePaths::with_base_dir(base),
        None => RestorePaths::new().context("Failed to resolve the program directory")?,
    };
    if let Some(dir) = cli.backups_dir {
        paths = paths.with_backups_dir(dir);
    }
    if let Some(file) = cli.env_file {
        paths = paths.with_env_file(file);
    }
    if let Some(file) = cli.output {
        paths = paths.with_output_file(file);
    }

    let mut stdout = io::stdout();

    if cli.list {
        return match list_backups(&paths, &mut stdout) {
            Ok(()) => Ok(0),
            Err(err) => {
                report_failure(&err, &mut stdout).context("Failed to write to stdout")?;
                Ok(err.exit_code())
            }
        };
    }

    let key_source = KeySource::new(paths.env_file()).with_variable(cli.key_var);

    let code = match cli.select {
        Some(answer) => Orchestrator::new(paths, key_source, ScriptedInput::new(answer))
            .execute(&mut stdout),
        None => Orchestrator::new(paths, key_source, ConsoleInput).execute(&mut stdout),
    }
    .context("Failed to write to stdout")?;

    Ok(code)
}
