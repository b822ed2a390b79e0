//! Plugin list command

use anyhow::Result;
use plugvault_core::Plugin;
use tabled::{
    settings::{object::Columns, Modify, Style, Width},
    Table, Tabled,
};

use super::common::{display_name, offline, open_manager, sync};
use crate::cli::{GlobalArgs, ListArgs};
use crate::output;

/// Row for the plugin table
#[derive(Tabled)]
pub(super) struct PluginRow {
    id: i64,
    name: String,
    owner: String,
    status: String,
    #[tabled(rename = "installed version")]
    installed_version: String,
    #[tabled(rename = "built")]
    built: String,
    downloads: u64,
    tags: String,
}

impl PluginRow {
    pub(super) fn from_plugin(plugin: &Plugin) -> Self {
        Self {
            id: plugin.id,
            name: display_name(plugin),
            owner: or_dash(&plugin.owner),
            status: output::status(plugin.status),
            installed_version: or_dash(&plugin.local_version),
            built: output::timestamp(plugin.local_timestamp),
            downloads: plugin.downloads,
            tags: or_dash(&plugin.tags.join(", ")),
        }
    }
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

/// Print plugins as a table
pub(super) fn print_table(plugins: &[Plugin]) {
    let rows: Vec<PluginRow> = plugins.iter().map(PluginRow::from_plugin).collect();
    let mut table = Table::new(rows);
    table
        .with(Style::sharp())
        .with(Modify::new(Columns::last()).with(Width::wrap(30)));
    println!("{}", table);
}

/// List plugins with optional filtering
///
/// Supports:
/// - Everything in the catalog: `plugvault list`
/// - Installed only: `plugvault list --installed`
/// - By tag: `plugvault list --tag biomechanics`
/// - From cache only: `plugvault list --offline`
/// - JSON output: `plugvault list --json`
pub async fn run(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    let manager = open_manager(global)?;
    if args.offline {
        offline(&manager);
    } else {
        sync(&manager, false).await?;
    }

    let plugins: Vec<Plugin> = manager
        .plugins()
        .into_iter()
        .filter(|p| !args.installed || p.local_copy)
        .filter(|p| {
            args.tag
                .as_ref()
                .is_none_or(|tag| p.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plugins)?);
        return Ok(());
    }

    if plugins.is_empty() {
        output::info("No plugins found");
        return Ok(());
    }
    print_table(&plugins);
    Ok(())
}
