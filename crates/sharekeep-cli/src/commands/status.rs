//! Status command - live mount state for every target.

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};

use crate::app::App;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Print machine-readable JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: &Args) -> Result<()> {
    let app = App::load()?;
    app.engine
        .refresh_statuses()
        .context("querying mount table")?;
    let targets = app.engine.targets();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }
    if targets.is_empty() {
        println!("No targets configured.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["NAME", "HOST", "MOUNTPOINT", "ENABLED", "ONLINE"]);
    for t in &targets {
        let mount_name = t.resolved_mount_name();
        table.add_row([
            Cell::new(&mount_name),
            Cell::new(&t.host),
            Cell::new(app.config.volumes_root.join(&mount_name).display()),
            Cell::new(if t.is_enabled { "yes" } else { "no" }),
            Cell::new(if t.is_online { "online" } else { "offline" }),
        ]);
    }
    println!("{table}");
    Ok(())
}
