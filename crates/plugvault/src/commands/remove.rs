//! Plugin remove command

use anyhow::{anyhow, Context, Result};
use dialoguer::Confirm;

use super::common::{display_name, offline, open_manager, resolve_plugin};
use crate::cli::{GlobalArgs, RemoveArgs};
use crate::output;

/// Remove an installed plugin
///
/// Supports:
/// - Remove with confirmation: `plugvault remove HeartFlow`
/// - Skip confirmation: `plugvault remove 42 -y`
pub async fn run(args: RemoveArgs, global: &GlobalArgs) -> Result<()> {
    let manager = open_manager(global)?;
    offline(&manager);
    let plugin = resolve_plugin(&manager, &args.plugin)?;
    let name = display_name(&plugin);

    if plugin.is_local() {
        return Err(anyhow!(
            "{} is a local plugin; use 'plugvault forget {}' to stop tracking it",
            name,
            plugin.id
        ));
    }
    if !plugin.local_copy {
        output::info(&format!("{} is not installed", name));
        return Ok(());
    }

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove {} ({} file(s))?",
                name,
                plugin.files.len()
            ))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            output::info("Cancelled");
            return Ok(());
        }
    }

    manager
        .delete_plugin(plugin.id)
        .with_context(|| format!("Failed to remove {}", name))?;
    output::success(&format!("Removed {}", name));
    Ok(())
}
