//! Missing plugin report
//!
//! A model names the plugins it needs. Everything installed is loaded the
//! way a host does at startup, then whatever is still absent is reported.

use anyhow::{anyhow, Context, Result};
use dialoguer::Confirm;
use tabled::{settings::Style, Table, Tabled};

use super::common::{open_manager, sync};
use super::install::install_one;
use crate::cli::{GlobalArgs, MissingArgs};
use crate::output;

#[derive(Tabled)]
struct MissingRow {
    name: String,
    #[tabled(rename = "catalog id")]
    id: String,
    #[tabled(rename = "how to get it")]
    remedy: String,
}

pub async fn run(args: MissingArgs, global: &GlobalArgs) -> Result<()> {
    let manager = open_manager(global)?;
    sync(&manager, false).await?;

    for id in manager.load_all_plugins() {
        output::warning(&format!("Installed plugin {} failed to load", id));
    }

    let missing = manager.find_missing(&args.names);
    if missing.is_empty() {
        output::success("All required plugins are loaded");
        return Ok(());
    }

    let rows: Vec<MissingRow> = missing
        .iter()
        .map(|(id, name)| MissingRow {
            name: name.clone(),
            id: if *id > 0 { id.to_string() } else { "-".to_string() },
            remedy: if *id > 0 {
                format!("plugvault install {}", id)
            } else {
                "locate the library and use 'plugvault load-local'".to_string()
            },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);

    let installable: Vec<i64> = missing.iter().map(|(id, _)| *id).filter(|id| *id > 0).collect();
    if !args.install || installable.is_empty() {
        return Err(anyhow!("{} required plugin(s) missing", missing.len()));
    }

    let confirmed = Confirm::new()
        .with_prompt(format!("Install {} plugin(s) from the repository?", installable.len()))
        .default(true)
        .interact()
        .context("Failed to read confirmation")?;
    if !confirmed {
        return Err(anyhow!("{} required plugin(s) missing", missing.len()));
    }

    for id in installable {
        if let Some(plugin) = manager.plugin(id) {
            install_one(&manager, &plugin).await?;
        }
    }

    let still_missing = manager.find_missing(&args.names);
    if still_missing.is_empty() {
        output::success("All required plugins are loaded");
        Ok(())
    } else {
        Err(anyhow!("{} required plugin(s) still missing", still_missing.len()))
    }
}
