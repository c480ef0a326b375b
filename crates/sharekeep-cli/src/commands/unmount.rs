//! Unmount command - unmount one target or everything.
//!
//! Manually unmounted targets are suppressed from automatic
//! reconnects until the next `sharekeep mount`.

use anyhow::Result;
use clap::Args as ClapArgs;

use crate::app::App;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Target: name, host or id prefix
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub target: Option<String>,

    /// Unmount every target
    #[arg(long)]
    pub all: bool,

    /// Force unmount even if the filesystem is busy
    #[arg(short, long)]
    pub force: bool,
}

pub fn execute(args: &Args, quiet: bool) -> Result<()> {
    let app = App::load()?;

    if let Some(selector) = &args.target {
        let target = app.find_target(selector)?;
        app.engine.unmount_target(target.id, args.force)?;
        if !quiet {
            println!("Unmounted {}", target.resolved_mount_name());
        }
        return Ok(());
    }

    let mut first_failure = None;
    for (id, outcome) in app.engine.unmount_all(args.force) {
        let name = app
            .engine
            .target(id)
            .map_or_else(|| id.to_string(), |t| t.resolved_mount_name());
        match outcome {
            Ok(()) => {
                if !quiet {
                    println!("Unmounted {name}");
                }
            }
            Err(e) => {
                eprintln!("Failed to unmount {name}: {e:#}");
                first_failure.get_or_insert(e);
            }
        }
    }
    match first_failure {
        None => Ok(()),
        Some(e) => Err(e.into()),
    }
}
