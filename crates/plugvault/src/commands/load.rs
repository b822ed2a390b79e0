//! Plugin load command
//!
//! Libraries stay loaded only for the lifetime of this process, so the
//! command is a check that installed plugins load cleanly.

use anyhow::{anyhow, Context, Result};

use super::common::{display_name, offline, open_manager, resolve_plugin};
use crate::cli::{GlobalArgs, LoadArgs};
use crate::output;

pub async fn run(args: LoadArgs, global: &GlobalArgs) -> Result<()> {
    let manager = open_manager(global)?;
    offline(&manager);

    if args.all {
        let failed = manager.load_all_plugins();
        let loaded = manager.plugins().iter().filter(|p| p.loaded).count();
        output::success(&format!("{} plugin(s) loaded", loaded));
        if !failed.is_empty() {
            for id in &failed {
                output::error(&format!("Plugin {} failed to load", id));
            }
            return Err(anyhow!("{} plugin(s) failed to load", failed.len()));
        }
        return Ok(());
    }

    let spec = args
        .plugin
        .as_deref()
        .ok_or_else(|| anyhow!("Name a plugin or pass --all"))?;
    let plugin = resolve_plugin(&manager, spec)?;
    let name = display_name(&plugin);

    manager
        .load_plugin(plugin.id)
        .with_context(|| format!("Failed to load {}", name))?;
    let handle = manager
        .plugin(plugin.id)
        .and_then(|p| p.allocator_id)
        .map(|h| h.to_string())
        .unwrap_or_default();
    output::success(&format!("Loaded {} {}", name, handle));

    manager
        .unload_plugin(plugin.id)
        .with_context(|| format!("Failed to unload {}", name))?;
    Ok(())
}
