//! Helpers shared by the plugin commands

use anyhow::{anyhow, Context, Result};
use plugvault_core::{HierarchicalConfigLoader, Plugin, PlugvaultConfig, ResolvedPaths};
use plugvault_manager::{LibraryLoader, PluginManager};
use std::sync::Arc;
use tracing::debug;

use crate::cli::GlobalArgs;
use crate::output;

/// Load configuration and apply command-line overrides
pub fn load_config(global: &GlobalArgs) -> Result<(PlugvaultConfig, ResolvedPaths)> {
    let loader = match &global.config_dir {
        Some(dir) => HierarchicalConfigLoader::with_dir(dir.clone()),
        None => HierarchicalConfigLoader::new().context("Failed to locate config directory")?,
    };
    let mut config = loader.load().context("Failed to load configuration")?;

    if let Some(url) = &global.repository_url {
        config.repository.base_url = url.clone();
    }
    if let Some(sdk) = &global.sdk_version {
        config.host.sdk_version = sdk.clone();
    }

    let paths = loader.resolve_paths(&config);
    debug!(
        "Using config dir {}, plugins dir {}",
        loader.config_dir(),
        paths.plugins_dir
    );
    Ok((config, paths))
}

/// Build a plugin manager from configuration
pub fn open_manager(global: &GlobalArgs) -> Result<PluginManager> {
    let (config, paths) = load_config(global)?;
    let loader = Arc::new(LibraryLoader::new(config.loader.entry_symbol.clone()));
    PluginManager::from_config(&config, &paths, loader)
        .context("Failed to initialize plugin manager")
}

/// Sync the catalog. An unreachable repository falls back to the cached
/// catalog; a rejected client version does not.
pub async fn sync(manager: &PluginManager, force: bool) -> Result<()> {
    let spinner = output::spinner("Synchronizing plugin catalog...");
    let result = manager.connect(force).await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() => Err(anyhow::Error::new(e)
            .context("This client is no longer supported; please upgrade plugvault")),
        Err(e) => {
            output::warning(&format!("Repository unavailable, using cached catalog: {}", e));
            Ok(())
        }
    }
}

/// Reconcile from the cached catalog only
pub fn offline(manager: &PluginManager) {
    if let Err(e) = manager.read_database() {
        output::warning(&format!("Some plugin statuses could not be determined: {}", e));
    }
}

/// Find a plugin by id or case-insensitive name
pub fn resolve_plugin(manager: &PluginManager, spec: &str) -> Result<Plugin> {
    if let Ok(id) = spec.parse::<i64>() {
        return manager
            .plugin(id)
            .ok_or_else(|| anyhow!("No plugin with id {}", id));
    }

    let mut matches: Vec<Plugin> = manager
        .plugins()
        .into_iter()
        .filter(|p| p.name.eq_ignore_ascii_case(spec))
        .collect();
    if matches.len() > 1 {
        let ids: Vec<String> = matches.iter().map(|p| p.id.to_string()).collect();
        return Err(anyhow!(
            "Several plugins are named '{}'; use an id instead ({})",
            spec,
            ids.join(", ")
        ));
    }
    matches
        .pop()
        .ok_or_else(|| anyhow!("No plugin named '{}'", spec))
}

/// Name for display, falling back to the id
pub fn display_name(plugin: &Plugin) -> String {
    if plugin.name.is_empty() {
        format!("plugin {}", plugin.id)
    } else {
        plugin.name.clone()
    }
}
