//! Daemon command - run the reconnect scheduler.
//!
//! Default mode detaches: the process re-executes itself with
//! `--foreground` in a new session-like process group, with standard
//! streams closed and logging redirected to a file. `--foreground`
//! runs the scheduler on the current terminal until Ctrl-C.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::app::App;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Stay attached to the terminal instead of detaching
    #[arg(long)]
    pub foreground: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Subscriber setup for the daemon: file-backed when a log file is in
/// play, stderr otherwise. Returns the appender guard that must stay
/// alive for the process lifetime.
pub fn setup_tracing(verbose: u8, args: &Args) -> Result<Option<WorkerGuard>> {
    let Some(path) = &args.log_file else {
        crate::setup_tracing(verbose);
        return Ok(None);
    };

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let name = path
        .file_name()
        .context("log file path has no file name")?;
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }

    let appender =
        tracing_appender::rolling::never(dir.unwrap_or(std::path::Path::new(".")), name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = crate::default_filter(verbose);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

pub fn execute(args: &Args) -> Result<()> {
    if args.foreground {
        run_foreground()
    } else {
        detach(args)
    }
}

fn run_foreground() -> Result<()> {
    let app = App::load()?;
    let engine = app.engine;

    let (tx, rx) = std::sync::mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("installing signal handler")?;

    tracing::info!(
        interval = ?app.config.reconnect_interval,
        volumes_root = %app.config.volumes_root.display(),
        "reconnect scheduler running"
    );
    engine.clone().start();
    let _ = rx.recv();
    tracing::info!("shutting down");
    engine.stop();
    Ok(())
}

#[cfg(unix)]
fn detach(args: &Args) -> Result<()> {
    use std::os::unix::process::CommandExt;
    use std::process::{Command, Stdio};

    let exe = std::env::current_exe().context("resolving own executable")?;
    let log_file = match &args.log_file {
        Some(path) => path.clone(),
        None => crate::app::config_dir()?.join("sharekeep.log"),
    };

    let mut cmd = Command::new(exe);
    cmd.arg("daemon")
        .arg("--foreground")
        .arg("--log-file")
        .arg(&log_file)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0);
    let child = cmd.spawn().context("spawning daemon process")?;

    println!("Daemon started (pid {})", child.id());
    println!("Logs: {}", log_file.display());
    Ok(())
}

#[cfg(not(unix))]
fn detach(_args: &Args) -> Result<()> {
    anyhow::bail!("detached mode is only supported on Unix; use --foreground")
}
