//! Installing, removing and side-loading plugins

use crate::error::{ManagerError, Result};
use crate::events::ManagerEvent;
use crate::loader::LoaderError;
use crate::manager::{name_from_path, next_local_id, PluginManager};
use plugvault_core::{Plugin, PluginId, PluginStatus};
use plugvault_repository::{DownloadProgress, RepositoryError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Progress of a chained plugin download
#[derive(Debug)]
enum DownloadState {
    /// Requesting the file with this index
    FetchingFile(u32),
    /// Every file is on disk; loading the main one
    Installing,
    Done,
    Failed(ManagerError),
}

impl PluginManager {
    /// Download and install every file of a catalog plugin, then load it.
    ///
    /// Files are requested one at a time starting at index 0, each response
    /// naming the index of the next. Any existing local copy is removed
    /// first, unless the catalog has no release for the host SDK, in which
    /// case nothing is touched.
    pub async fn download_plugin(&self, id: PluginId) -> Result<()> {
        if id < 0 {
            return Err(ManagerError::NotInRepository(id));
        }
        self.require_plugin(id)?;
        let _guard = self.begin(id)?;

        if self.cache.list_versions_for_sdk(id, &self.sdk_version).is_empty() {
            let e = ManagerError::Unavailable(id, self.sdk_version.clone());
            warn!("Not downloading plugin {}: {}", id, e);
            return Err(e);
        }

        if let Err(e) = self.uninstall(id) {
            error!("Cannot replace existing copy of plugin {}: {}", id, e);
            self.emit_error(&e);
            return Err(e);
        }

        self.set_status(id, PluginStatus::Downloading);
        self.emit(ManagerEvent::PluginUpdated { id });
        info!("Downloading plugin {}", id);

        let dest_dir = self.plugins_dir.join(id.to_string());
        let mut requested = HashSet::from([0u32]);
        let mut state = DownloadState::FetchingFile(0);
        let mut chain_finished = false;

        loop {
            state = match state {
                DownloadState::FetchingFile(index) => {
                    match self.fetch_and_record(id, index, &dest_dir).await {
                        Ok(None) => DownloadState::Installing,
                        Ok(Some(next)) if requested.insert(next) => {
                            DownloadState::FetchingFile(next)
                        }
                        Ok(Some(next)) => DownloadState::Failed(ManagerError::Repository(
                            RepositoryError::MalformedResponse(format!(
                                "file index {} requested twice",
                                next
                            )),
                        )),
                        Err(e) => DownloadState::Failed(e),
                    }
                }
                DownloadState::Installing => {
                    chain_finished = true;
                    match self.finish_install(id) {
                        Ok(()) => DownloadState::Done,
                        Err(e) => DownloadState::Failed(e),
                    }
                }
                DownloadState::Done => {
                    info!("Plugin {} installed", id);
                    return Ok(());
                }
                DownloadState::Failed(e) => {
                    self.abandon_download(id, &e, chain_finished);
                    return Err(e);
                }
            };
        }
    }

    /// Fetch one file and record it. Returns the next index, if any.
    async fn fetch_and_record(
        &self,
        id: PluginId,
        index: u32,
        dest_dir: &Path,
    ) -> Result<Option<u32>> {
        let mut report = |progress: DownloadProgress| {
            self.emit(ManagerEvent::DownloadProgress {
                id,
                file_index: index,
                downloaded_bytes: progress.downloaded_bytes,
                total_bytes: progress.total_bytes,
            })
        };
        let file = self
            .repository
            .fetch_plugin_file(id, index, dest_dir, &mut report)
            .await?;

        // Older servers omit the timestamp; use the catalog's build time
        let timestamp = match file.info.timestamp {
            Some(ts) => ts,
            None => self.catalog_timestamp(id, &file.info.version),
        };

        {
            let mut state = self.state();
            let plugin = state
                .plugins
                .get_mut(&id)
                .ok_or(ManagerError::UnknownPlugin(id))?;
            plugin.add_file(file.path.clone(), file.info.is_main);
            plugin.local_version = file.info.version.clone();
            plugin.local_sdk_version = file.info.sdk_version.clone();
            plugin.local_timestamp = timestamp;
        }
        self.save_ledger()?;

        debug!(
            "Recorded {} ({} bytes) for plugin {}",
            file.path.display(),
            file.size,
            id
        );
        Ok(file.info.next_file_index)
    }

    fn catalog_timestamp(&self, id: PluginId, version: &str) -> i64 {
        let versions = self.cache.list_versions_for_sdk(id, &self.sdk_version);
        versions
            .iter()
            .find(|v| v.version == version)
            .or_else(|| versions.iter().max_by_key(|v| v.timestamp))
            .map(|v| v.timestamp)
            .unwrap_or(0)
    }

    fn finish_install(&self, id: PluginId) -> Result<()> {
        {
            let mut state = self.state();
            let plugin = state
                .plugins
                .get_mut(&id)
                .ok_or(ManagerError::UnknownPlugin(id))?;
            if plugin.files.is_empty() {
                return Err(ManagerError::NotInstalled(id));
            }
            if plugin.main_file.is_none() {
                warn!("Plugin {} flagged no main file, using the first", id);
                plugin.main_file = Some(0);
            }
        }
        self.save_ledger()?;

        self.load_unguarded(id)?;
        if let Some(plugin) = self.state().plugins.get_mut(&id) {
            plugin.downloads += 1;
        }
        self.refresh_status_logged(id);
        self.emit(ManagerEvent::DownloadFinished { id });
        Ok(())
    }

    fn abandon_download(&self, id: PluginId, err: &ManagerError, chain_finished: bool) {
        error!("Download of plugin {} failed: {}", id, err);
        self.emit_error(err);

        // Leave a sensible status even if the rules cannot run
        if let Some(plugin) = self.state().plugins.get_mut(&id) {
            // Without an entry point the partial install reads as broken,
            // in memory and in the ledger
            if !chain_finished {
                plugin.main_file = None;
            }
            plugin.status = if plugin.local_copy {
                PluginStatus::Broken
            } else {
                PluginStatus::NotInstalled
            };
        }
        self.refresh_status_logged(id);
        if let Err(e) = self.save_ledger() {
            warn!("Failed to record partial install of plugin {}: {}", id, e);
        }
        self.emit(ManagerEvent::PluginUpdated { id });
    }

    fn set_status(&self, id: PluginId, status: PluginStatus) {
        if let Some(plugin) = self.state().plugins.get_mut(&id) {
            plugin.status = status;
        }
    }

    /// Unload a catalog plugin and remove its files. Removing a plugin
    /// that is not installed is not an error.
    pub fn delete_plugin(&self, id: PluginId) -> Result<()> {
        if id < 0 {
            return Err(ManagerError::NotInRepository(id));
        }
        self.require_plugin(id)?;
        let _guard = self.begin(id)?;

        let result = self.uninstall(id);
        if let Err(e) = &result {
            error!("Failed to delete plugin {}: {}", id, e);
            self.emit_error(e);
        }
        result
    }

    fn uninstall(&self, id: PluginId) -> Result<()> {
        let (files, loaded) = {
            let state = self.state();
            let plugin = state
                .plugins
                .get(&id)
                .ok_or(ManagerError::UnknownPlugin(id))?;
            if !plugin.local_copy {
                return Ok(());
            }
            (plugin.files.clone(), plugin.loaded)
        };

        if loaded {
            self.unload_unguarded(id)?;
        }

        for path in &files {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("{} already gone", path.display())
                }
                Err(source) => {
                    return Err(ManagerError::RemoveFile {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }

        if let Some(plugin) = self.state().plugins.get_mut(&id) {
            plugin.clear_install();
        }

        // Only succeeds when empty
        let plugin_dir = self.plugins_dir.join(id.to_string());
        if std::fs::remove_dir(&plugin_dir).is_ok() {
            debug!("Removed {}", plugin_dir.display());
        }

        self.refresh_status_logged(id);
        self.save_ledger()?;
        info!("Deleted plugin {}", id);
        self.emit(ManagerEvent::PluginUpdated { id });
        Ok(())
    }

    /// Load a plugin library the repository does not know about.
    ///
    /// A local plugin with the same file name is repointed at `path`;
    /// otherwise a new local plugin is tracked. Returns its id.
    pub fn load_non_repo_plugin(&self, path: &Path) -> Result<PluginId> {
        if !path.exists() {
            return Err(LoaderError::MissingFile(path.to_path_buf()).into());
        }
        let path = path.canonicalize()?;
        let file_name = path.file_name().map(|n| n.to_os_string());

        let (id, created) = {
            let mut state = self.state();
            let existing = state
                .plugins
                .values()
                .find(|p| {
                    p.is_local() && p.main_file_name() == file_name.as_deref()
                })
                .map(|p| p.id);
            match existing {
                Some(id) => (id, false),
                None => {
                    let id = next_local_id(&state.plugins);
                    let mut plugin = Plugin::new(id);
                    plugin.name = name_from_path(&path);
                    state.plugins.insert(id, plugin);
                    (id, true)
                }
            }
        };
        let _guard = self.begin(id)?;

        let result = self.point_local_plugin(id, path.clone());
        match &result {
            Ok(()) => info!("Tracking local plugin {} as {}", path.display(), id),
            Err(e) => {
                warn!("Failed to load local plugin {}: {}", id, e);
                if created {
                    self.state().plugins.remove(&id);
                }
                self.emit_error(e);
            }
        }
        self.save_ledger()?;
        result.map(|()| id)
    }

    fn point_local_plugin(&self, id: PluginId, path: PathBuf) -> Result<()> {
        let stale = self
            .plugin(id)
            .filter(|p| p.loaded && p.main_file_path() != Some(path.as_path()))
            .is_some();
        if stale {
            self.unload_unguarded(id)?;
        }

        if let Some(plugin) = self.state().plugins.get_mut(&id) {
            if plugin.main_file_path() != Some(path.as_path()) {
                plugin.files.clear();
                plugin.main_file = None;
                plugin.add_file(path, true);
            }
            plugin.status = PluginStatus::Local;
        }
        self.load_unguarded(id)
    }

    /// Unload a local plugin and stop tracking it. Its files are left
    /// where they are.
    pub fn remove_local_plugin(&self, id: PluginId) -> Result<()> {
        if id >= 0 {
            return Err(ManagerError::NotLocal(id));
        }
        self.require_plugin(id)?;
        let _guard = self.begin(id)?;

        if self.plugin(id).is_some_and(|p| p.loaded) {
            if let Err(e) = self.unload_unguarded(id) {
                self.emit_error(&e);
                return Err(e);
            }
        }

        self.state().plugins.remove(&id);
        self.save_ledger()?;
        info!("Stopped tracking local plugin {}", id);
        self.emit(ManagerEvent::PluginUpdated { id });
        Ok(())
    }
}
