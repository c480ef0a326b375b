//! List command - show configured targets.

use anyhow::Result;
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
    let targets = app.engine.targets();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }
    if targets.is_empty() {
        println!("No targets configured. Add one with: sharekeep add <host> <share>");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["ID", "NAME", "HOST", "SHARE", "USER", "PORT", "ENABLED"]);
    for t in &targets {
        let id = t.id.to_string();
        table.add_row([
            Cell::new(&id[..8]),
            Cell::new(t.resolved_mount_name()),
            Cell::new(&t.host),
            Cell::new(&t.share_or_path),
            Cell::new(&t.username),
            Cell::new(t.port.map_or_else(|| "-".to_string(), |p| p.to_string())),
            Cell::new(if t.is_enabled { "yes" } else { "no" }),
        ]);
    }
    println!("{table}");
    Ok(())
}
