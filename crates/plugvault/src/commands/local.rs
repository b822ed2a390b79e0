//! Local plugin commands

use anyhow::{anyhow, Context, Result};

use super::common::{display_name, offline, open_manager, resolve_plugin};
use crate::cli::{ForgetArgs, GlobalArgs, LoadLocalArgs};
use crate::output;

/// Track and load a library the repository does not know about
pub async fn load(args: LoadLocalArgs, global: &GlobalArgs) -> Result<()> {
    let manager = open_manager(global)?;
    offline(&manager);

    let id = manager
        .load_non_repo_plugin(args.path.as_std_path())
        .with_context(|| format!("Failed to load {}", args.path))?;
    output::success(&format!("Tracking {} as local plugin {}", args.path, id));
    Ok(())
}

/// Stop tracking a local plugin; its files are left in place
pub async fn forget(args: ForgetArgs, global: &GlobalArgs) -> Result<()> {
    let manager = open_manager(global)?;
    offline(&manager);
    let plugin = resolve_plugin(&manager, &args.plugin)?;
    let name = display_name(&plugin);

    if !plugin.is_local() {
        return Err(anyhow!(
            "{} comes from the repository; use 'plugvault remove {}' instead",
            name,
            plugin.id
        ));
    }

    manager
        .remove_local_plugin(plugin.id)
        .with_context(|| format!("Failed to forget {}", name))?;
    output::success(&format!("No longer tracking {}", name));
    Ok(())
}
