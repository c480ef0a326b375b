//! Edit command - change fields of an existing target.

use anyhow::{Context, Result};
use clap::Args as ClapArgs;

use crate::app::App;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Target to edit: name, host or id prefix
    pub target: String,

    /// New display label
    #[arg(long)]
    pub name: Option<String>,

    /// New server address
    #[arg(long)]
    pub host: Option<String>,

    /// New share name or sub-path
    #[arg(long)]
    pub share: Option<String>,

    /// New login name
    #[arg(long)]
    pub username: Option<String>,

    /// New port
    #[arg(long, conflicts_with = "clear_port")]
    pub port: Option<u16>,

    /// Use the protocol default port again
    #[arg(long)]
    pub clear_port: bool,

    /// Include in auto-mount and reconnect
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    /// Exclude from auto-mount and reconnect
    #[arg(long)]
    pub disable: bool,
}

pub fn execute(args: &Args) -> Result<()> {
    let app = App::load()?;
    let mut target = app.find_target(&args.target)?;
    let old_account = target.keychain_account();

    if let Some(name) = &args.name {
        target.name = name.clone();
    }
    if let Some(host) = &args.host {
        target.host = host.clone();
    }
    if let Some(share) = &args.share {
        target.share_or_path = share.clone();
    }
    if let Some(username) = &args.username {
        target.username = username.clone();
    }
    if args.clear_port {
        target.port = None;
    } else if let Some(port) = args.port {
        target.port = Some(port);
    }
    if args.enable {
        target.is_enabled = true;
    } else if args.disable {
        target.is_enabled = false;
    }

    let new_account = target.keychain_account();
    let mount_name = target.resolved_mount_name();
    app.engine
        .update_target(target)
        .context("saving target list")?;
    println!("Updated {mount_name}");

    // The saved password follows the target to its new account.
    if new_account != old_account {
        let moved = sharekeep_core::migrate_secret(&*app.credentials, &old_account, &new_account)
            .context("moving stored password")?;
        if moved {
            println!("Moved stored password to {new_account}");
        } else {
            eprintln!(
                "No stored password for {old_account}; \
                 store one with: sharekeep password set {mount_name}"
            );
        }
    }
    Ok(())
}
