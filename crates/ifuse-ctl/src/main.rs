// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use ifuse_ctl::config::CONFIG_PATH_ENV;
use ifuse_ctl::{
    resolve_mount_path, CtlConfig, CtlError, DirectoryOpener, Dispatcher, Report, Transport,
};
use ifuse_ioctl::Operation;
use ifuse_logging::CliLoggingArgs;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "irodsfs-ctl",
    author,
    version,
    about = "Send control requests to a mounted iRODS FUSE filesystem",
    arg_required_else_help = true,
    after_help = commands_help()
)]
struct Cli {
    /// Control command to run (case-insensitive)
    command: String,

    /// Path to the mounted filesystem (e.g. /mnt/irods)
    mount: PathBuf,

    /// Accepted for compatibility and ignored
    #[arg(hide = true)]
    extra: Vec<String>,

    /// Give up on the driver after this many milliseconds (0 waits forever)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// TOML file with default settings
    #[arg(long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    #[command(flatten)]
    logging: CliLoggingArgs,
}

fn commands_help() -> String {
    let mut help = String::from("Available commands:\n");
    for op in Operation::ALL {
        help.push_str(&format!("  {:<18}{}\n", op.name(), op.description()));
    }
    help
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.kind() == clap::error::ErrorKind::MissingRequiredArgument => {
            let _ = err.print();
            eprintln!("\n{}", commands_help());
            return ExitCode::from(2);
        }
        Err(err) => err.exit(),
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.downcast_ref::<CtlError>().map_or(1, CtlError::exit_code);
            debug!(exit_code = code, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = CtlConfig::load(cli.config.as_deref())?.with_overrides(cli.timeout_ms, cli.json);
    cli.logging
        .or(config.log_level, config.log_format)
        .init("ifuse-ctl")?;

    if !cli.extra.is_empty() {
        debug!(extra = ?cli.extra, "ignoring extra arguments");
    }

    let transport = Transport::new(DirectoryOpener).with_timeout(config.timeout());
    let dispatcher = Dispatcher::new(transport);
    let outcome = dispatcher.execute(&cli.command, &cli.mount)?;

    let report = Report::new(outcome, resolve_mount_path(&cli.mount)?);
    let mut stdout = io::stdout().lock();
    let written = if config.json {
        report.write_json(&mut stdout)
    } else {
        report.write_plaintext(&mut stdout)
    };
    written
        .and_then(|()| stdout.flush())
        .context("failed to write report")
}
