//! Catalog synchronization command

use anyhow::{Context, Result};
use plugvault_core::PluginStatus;
use std::collections::BTreeMap;

use super::common::open_manager;
use crate::cli::{ConnectArgs, GlobalArgs};
use crate::output;

/// Synchronize the catalog and summarize plugin status
///
/// Supports:
/// - Sync when needed: `plugvault connect`
/// - Force a full re-sync: `plugvault connect --force`
pub async fn run(args: ConnectArgs, global: &GlobalArgs) -> Result<()> {
    let manager = open_manager(global)?;

    let spinner = output::spinner("Synchronizing plugin catalog...");
    let result = manager.connect(args.force).await;
    spinner.finish_and_clear();
    result.context("Failed to synchronize plugin catalog")?;

    let plugins = manager.plugins();
    output::success(&format!("Catalog synchronized ({} plugins)", plugins.len()));

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for plugin in &plugins {
        *counts.entry(plugin.status.label()).or_default() += 1;
    }
    for (label, count) in counts {
        output::kv(label, &count.to_string());
    }

    let updates = plugins
        .iter()
        .filter(|p| p.status == PluginStatus::OutOfDate)
        .count();
    if updates > 0 {
        output::info(&format!(
            "{} update(s) available, run 'plugvault list --installed' for details",
            updates
        ));
    }
    Ok(())
}
