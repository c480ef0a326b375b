#![deny(unsafe_code)]

mod app;
mod commands;
mod exit_code;

use std::io::{self, ErrorKind};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sharekeep_core::{CredentialError, MountError};

use crate::app::SelectError;
use crate::commands::{add, daemon, edit, list, mount, password, remove, status, unmount};

/// Keep SMB network shares mounted
#[derive(Parser)]
#[command(name = "sharekeep")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Configure a share and store its password
    sharekeep add nas.local Media --name media --username alice

    # Mount everything that is configured and enabled
    sharekeep mount --all

    # Keep shares connected in the background
    sharekeep daemon

    # See what is mounted right now
    sharekeep status
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a share target
    Add(add::Args),

    /// Change fields of an existing target
    Edit(edit::Args),

    /// Remove a target
    Remove(remove::Args),

    /// List configured targets
    List(list::Args),

    /// Show live mount status for every target
    Status(status::Args),

    /// Store or clear a share password
    #[command(subcommand)]
    Password(password::Command),

    /// Mount one target, or all enabled targets
    Mount(mount::Args),

    /// Unmount one target, or all targets
    Unmount(unmount::Args),

    /// Run the reconnect scheduler
    Daemon(daemon::Args),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            let code = categorize_error(&e);

            // Quiet is re-parsed here because the failure may predate
            // clap parsing succeeding.
            let args: Vec<String> = std::env::args().collect();
            let is_quiet = args.iter().any(|a| a == "-q" || a == "--quiet");
            if !is_quiet {
                eprintln!("Error: {e:#}");
            }

            ExitCode::from(code)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // The daemon manages its own subscriber (optional log file);
    // everything else logs to stderr.
    let _guard = match &cli.command {
        Commands::Daemon(args) => daemon::setup_tracing(cli.verbose, args)?,
        _ => {
            setup_tracing(cli.verbose);
            None
        }
    };

    match cli.command {
        Commands::Add(args) => add::execute(&args),
        Commands::Edit(args) => edit::execute(&args),
        Commands::Remove(args) => remove::execute(&args),
        Commands::List(args) => list::execute(&args),
        Commands::Status(args) => status::execute(&args),
        Commands::Password(cmd) => password::execute(&cmd),
        Commands::Mount(args) => mount::execute(&args, cli.quiet),
        Commands::Unmount(args) => unmount::execute(&args, cli.quiet),
        Commands::Daemon(args) => daemon::execute(&args),
    }
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = default_filter(verbose);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

pub(crate) fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Categorize an error into an exit code using typed error
/// downcasting rather than message matching.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(select) = cause.downcast_ref::<SelectError>() {
            return match select {
                SelectError::NoSuchTarget(_) => exit_code::NOT_FOUND,
                SelectError::Ambiguous(_) => exit_code::GENERAL_ERROR,
            };
        }
        if let Some(mount) = cause.downcast_ref::<MountError>() {
            return match mount {
                MountError::MissingCredential { .. } => exit_code::CREDENTIAL_MISSING,
                MountError::UnknownTarget(_) => exit_code::NOT_FOUND,
                MountError::CommandFailed(_) | MountError::ResolutionExhausted { .. } => {
                    exit_code::MOUNT_FAILED
                }
                MountError::Credential(_) => exit_code::PERMISSION_DENIED,
                MountError::Io(io_err) => return categorize_io(io_err),
            };
        }
        if let Some(cred) = cause.downcast_ref::<CredentialError>() {
            let CredentialError::Backend(_) = cred;
            return exit_code::PERMISSION_DENIED;
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return categorize_io(io_err);
        }
    }
    exit_code::GENERAL_ERROR
}

fn categorize_io(e: &io::Error) -> u8 {
    match e.kind() {
        ErrorKind::NotFound => exit_code::NOT_FOUND,
        ErrorKind::PermissionDenied => exit_code::PERMISSION_DENIED,
        _ => exit_code::GENERAL_ERROR,
    }
}
