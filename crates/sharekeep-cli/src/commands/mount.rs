//! Mount command - mount one target or every enabled target.

use anyhow::Result;
use clap::Args as ClapArgs;

use crate::app::App;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Target: name, host or id prefix
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub target: Option<String>,

    /// Mount every enabled target
    #[arg(long)]
    pub all: bool,
}

pub fn execute(args: &Args, quiet: bool) -> Result<()> {
    let app = App::load()?;

    if let Some(selector) = &args.target {
        let target = app.find_target(selector)?;
        let path = app.engine.mount_target(target.id)?;
        if !quiet {
            println!("Mounted {} at {}", target.resolved_mount_name(), path.display());
        }
        return Ok(());
    }

    let mut first_failure = None;
    for (id, outcome) in app.engine.mount_all() {
        let name = app
            .engine
            .target(id)
            .map_or_else(|| id.to_string(), |t| t.resolved_mount_name());
        match outcome {
            Ok(path) => {
                if !quiet {
                    println!("Mounted {name} at {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("Failed to mount {name}: {e:#}");
                first_failure.get_or_insert(e);
            }
        }
    }
    match first_failure {
        None => Ok(()),
        Some(e) => Err(e.into()),
    }
}
