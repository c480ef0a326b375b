//! Remove command - delete a configured target.
//!
//! Deletion also purges the stored password. The engine keeps it when
//! another target points at the same host and share, since those
//! reuse one credential account.

use anyhow::{Context, Result};
use clap::Args as ClapArgs;

use crate::app::App;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Target to remove: name, host or id prefix
    pub target: String,

    /// Keep the stored password even if no other target uses it
    #[arg(long)]
    pub keep_password: bool,
}

pub fn execute(args: &Args) -> Result<()> {
    let app = App::load()?;
    let target = app.find_target(&args.target)?;
    let removed = app
        .engine
        .remove_target(target.id, args.keep_password)
        .context("removing target")?;
    println!("Removed {}", removed.resolved_mount_name());
    Ok(())
}
