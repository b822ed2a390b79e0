//! Catalog search command

use anyhow::Result;
use plugvault_core::Plugin;

use super::common::{open_manager, sync};
use super::list::print_table;
use crate::cli::{GlobalArgs, SearchArgs};
use crate::output;

/// Search plugin names, owners, descriptions and tags
pub async fn run(args: SearchArgs, global: &GlobalArgs) -> Result<()> {
    let manager = open_manager(global)?;
    sync(&manager, false).await?;

    let ids = manager.search(&args.term);
    let plugins: Vec<Plugin> = manager
        .plugins()
        .into_iter()
        .filter(|p| ids.contains(&p.id))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plugins)?);
        return Ok(());
    }

    if plugins.is_empty() {
        output::info(&format!("No plugins match '{}'", args.term));
        let tags = manager.all_tags();
        if !tags.is_empty() {
            output::kv("Known tags", &tags.join(", "));
        }
        return Ok(());
    }
    print_table(&plugins);
    Ok(())
}
