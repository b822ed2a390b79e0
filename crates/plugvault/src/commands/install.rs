//! Plugin install command

use anyhow::{anyhow, Context, Result};
use indicatif::ProgressBar;
use plugvault_core::{Plugin, PluginId, PluginStatus};
use plugvault_manager::{ManagerEvent, PluginManager};
use tokio::sync::broadcast::error::RecvError;

use super::common::{display_name, open_manager, resolve_plugin, sync};
use crate::cli::{GlobalArgs, InstallArgs};
use crate::output;

/// Mirror download progress events onto a progress bar
fn watch_progress(
    manager: &PluginManager,
    id: PluginId,
    name: String,
    bar: ProgressBar,
) -> tokio::task::JoinHandle<()> {
    let mut events = manager.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ManagerEvent::DownloadProgress {
                    id: event_id,
                    file_index,
                    downloaded_bytes,
                    total_bytes,
                }) if event_id == id => {
                    bar.set_length(total_bytes);
                    bar.set_position(downloaded_bytes);
                    bar.set_message(format!("{} (file {})", name, file_index + 1));
                }
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Download one plugin, showing progress
pub(super) async fn install_one(manager: &PluginManager, plugin: &Plugin) -> Result<()> {
    let name = display_name(plugin);
    match plugin.status {
        PluginStatus::Local => return Err(anyhow!("{} is a local plugin", name)),
        PluginStatus::Unavailable => {
            return Err(anyhow!(
                "{} has no release for SDK {}",
                name,
                manager.sdk_version()
            ))
        }
        PluginStatus::UpToDate => {
            output::info(&format!("{} is already up to date, reinstalling", name));
        }
        _ => {}
    }

    let bar = output::download_bar(&name);
    let watcher = watch_progress(manager, plugin.id, name.clone(), bar.clone());
    let result = manager.download_plugin(plugin.id).await;
    watcher.abort();
    bar.finish_and_clear();

    result.with_context(|| format!("Failed to install {}", name))?;
    let installed = manager.plugin(plugin.id);
    let version = installed
        .as_ref()
        .map(|p| p.local_version.as_str())
        .unwrap_or_default();
    output::success(&format!("Installed {} {}", name, version));
    Ok(())
}

/// Install one or more plugins
///
/// Supports:
/// - By name: `plugvault install HeartFlow`
/// - By id: `plugvault install 42`
/// - Several at once: `plugvault install 42 MeshTools`
pub async fn run(args: InstallArgs, global: &GlobalArgs) -> Result<()> {
    let manager = open_manager(global)?;
    sync(&manager, false).await?;

    let mut failures = 0;
    for spec in &args.plugins {
        let outcome = match resolve_plugin(&manager, spec) {
            Ok(plugin) => install_one(&manager, &plugin).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            output::error(&format!("{:#}", e));
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(anyhow!("{} of {} plugin(s) failed to install", failures, args.plugins.len()));
    }
    Ok(())
}
