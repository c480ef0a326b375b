//! Password command - store or clear share credentials.

use std::io::{BufRead, IsTerminal};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Subcommand};

use crate::app::App;

#[derive(Subcommand, Clone)]
pub enum Command {
    /// Store (or replace) the password for a target
    Set(SetArgs),

    /// Delete the stored password for a target
    Clear(ClearArgs),
}

#[derive(ClapArgs, Clone)]
pub struct SetArgs {
    /// Target: name, host or id prefix
    pub target: String,
}

#[derive(ClapArgs, Clone)]
pub struct ClearArgs {
    /// Target: name, host or id prefix
    pub target: String,
}

pub fn execute(cmd: &Command) -> Result<()> {
    match cmd {
        Command::Set(args) => set(args),
        Command::Clear(args) => clear(args),
    }
}

fn set(args: &SetArgs) -> Result<()> {
    let app = App::load()?;
    let target = app.find_target(&args.target)?;
    let account = target.keychain_account();

    let secret = if std::io::stdin().is_terminal() {
        rpassword::prompt_password(format!("Password for {account}: "))
            .context("reading password")?
    } else {
        // Piped input: first line, for use from scripts and secret
        // managers.
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("reading password from stdin")?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };
    anyhow::ensure!(!secret.is_empty(), "refusing to store an empty password");

    app.credentials
        .set(&account, &secret)
        .context("storing password")?;
    println!("Password stored for {account}");
    Ok(())
}

fn clear(args: &ClearArgs) -> Result<()> {
    let app = App::load()?;
    let target = app.find_target(&args.target)?;
    let account = target.keychain_account();
    app.credentials
        .delete(&account)
        .context("deleting password")?;
    println!("Password cleared for {account}");
    Ok(())
}
