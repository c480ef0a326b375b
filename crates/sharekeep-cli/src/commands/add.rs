//! Add command - configure a new share target.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;

use sharekeep_core::MountTarget;

use crate::app::App;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Server address or hostname (e.g. nas.local, 192.168.1.10)
    pub host: String,

    /// Share name or sub-path on the server (e.g. Media, exports/daily)
    pub share: String,

    /// Display label, also used as the mountpoint name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Login name for the share
    #[arg(short, long)]
    pub username: Option<String>,

    /// Port, if the server does not listen on the SMB default
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Add the target without enabling auto-mount
    #[arg(long)]
    pub disabled: bool,

    /// Do not prompt for a password now
    #[arg(long)]
    pub no_password: bool,
}

pub fn execute(args: &Args) -> Result<()> {
    let app = App::load()?;

    let mut target = MountTarget::new(
        args.name.clone().unwrap_or_default(),
        args.host.clone(),
        args.share.clone(),
        args.username.clone().unwrap_or_default(),
        args.port,
    );
    target.is_enabled = !args.disabled;

    let account = target.keychain_account();
    let mount_name = target.resolved_mount_name();
    let id = target.id;

    app.engine
        .add_target(target)
        .context("saving target list")?;
    println!("Added {mount_name} ({id})");

    if args.no_password {
        return Ok(());
    }
    if !std::io::stdin().is_terminal() {
        eprintln!("No terminal; store a password later with: sharekeep password set {mount_name}");
        return Ok(());
    }

    let secret = rpassword::prompt_password(format!("Password for {account}: "))
        .context("reading password")?;
    if secret.is_empty() {
        eprintln!("Empty password, nothing stored");
        return Ok(());
    }
    app.credentials
        .set(&account, &secret)
        .context("storing password")?;
    println!("Password stored for {account}");
    Ok(())
}
