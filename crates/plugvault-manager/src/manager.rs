//! Plugin lifecycle orchestration
//!
//! [`PluginManager`] keeps four views of the plugin world consistent: the
//! remote catalog, its local cache, the install ledger, and what the native
//! loader actually has loaded. All shared state sits behind one mutex that
//! is never held across an `.await`; per-plugin operations are serialized by
//! a busy set instead.

use crate::error::{ManagerError, Result};
use crate::events::ManagerEvent;
use crate::ledger::LocalLedger;
use crate::loader::{LoadedInstance, NativeLoader};
use crate::status::{derive_status, StatusInputs};
use plugvault_cache::MetadataCache;
use plugvault_core::{
    CatalogVersion, Plugin, PluginId, PluginStatus, PlugvaultConfig, Publication, ResolvedPaths,
};
use plugvault_repository::{RepositoryClient, RepositoryError, SubmissionRequest};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Capacity of the event channel per subscriber
const EVENT_CAPACITY: usize = 256;

/// Repository connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
    /// The server rejected this client version; no further attempts
    ClientTooOld,
}

#[derive(Default)]
pub(crate) struct ManagerState {
    pub(crate) plugins: BTreeMap<PluginId, Plugin>,
    pub(crate) connection: ConnectionState,
    pub(crate) busy: HashSet<PluginId>,
}

/// Marks a plugin busy for as long as it lives
pub(crate) struct BusyGuard<'a> {
    manager: &'a PluginManager,
    id: PluginId,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.manager.state().busy.remove(&self.id);
    }
}

/// Catalog data for one plugin, gathered outside the state lock
struct CatalogDetails {
    tags: Vec<String>,
    publications: Vec<Publication>,
    versions: Vec<CatalogVersion>,
}

/// Orchestrates plugin discovery, install, removal and loading
pub struct PluginManager {
    pub(crate) repository: RepositoryClient,
    pub(crate) cache: MetadataCache,
    ledger: LocalLedger,
    pub(crate) loader: Arc<dyn NativeLoader>,
    pub(crate) plugins_dir: PathBuf,
    pub(crate) sdk_version: String,
    state: Mutex<ManagerState>,
    /// Serializes ledger snapshots with their writes
    ledger_write: Mutex<()>,
    events: broadcast::Sender<ManagerEvent>,
}

/// Next free id for a plugin the repository does not track
pub(crate) fn next_local_id(plugins: &BTreeMap<PluginId, Plugin>) -> PluginId {
    plugins.keys().next().copied().unwrap_or(0).min(0) - 1
}

/// Display name for a plugin known only by its file
pub(crate) fn name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Match loader instances to tracked plugins by main file path. Instances
/// nobody tracks become new local plugins.
fn reconcile_loaded(plugins: &mut BTreeMap<PluginId, Plugin>, instances: &[LoadedInstance]) {
    for plugin in plugins.values_mut() {
        plugin.mark_unloaded();
    }

    for instance in instances {
        if let Some(plugin) = plugins
            .values_mut()
            .find(|p| p.main_file_path() == Some(instance.path.as_path()))
        {
            plugin.mark_loaded(instance.handle);
            continue;
        }

        let id = next_local_id(plugins);
        let mut plugin = Plugin::new(id);
        plugin.name = name_from_path(&instance.path);
        plugin.add_file(instance.path.clone(), true);
        plugin.mark_loaded(instance.handle);
        info!(
            "Tracking externally loaded plugin {} as {}",
            instance.path.display(),
            id
        );
        plugins.insert(id, plugin);
    }
}

impl PluginManager {
    /// Create a manager and load the install ledger
    pub fn new(
        repository: RepositoryClient,
        cache: MetadataCache,
        ledger: LocalLedger,
        loader: Arc<dyn NativeLoader>,
        plugins_dir: impl Into<PathBuf>,
        sdk_version: impl Into<String>,
    ) -> Self {
        let mut plugins = BTreeMap::new();
        for entry in ledger.load() {
            plugins.insert(entry.id, Plugin::from_ledger(&entry));
        }
        debug!("Loaded {} plugins from ledger", plugins.len());

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            repository,
            cache,
            ledger,
            loader,
            plugins_dir: plugins_dir.into(),
            sdk_version: sdk_version.into(),
            state: Mutex::new(ManagerState {
                plugins,
                ..Default::default()
            }),
            ledger_write: Mutex::new(()),
            events,
        }
    }

    /// Build a manager from loaded configuration. An unusable cache file
    /// falls back to an in-memory cache.
    pub fn from_config(
        config: &PlugvaultConfig,
        paths: &ResolvedPaths,
        loader: Arc<dyn NativeLoader>,
    ) -> Result<Self> {
        let repository = RepositoryClient::new(&config.repository, &config.network)?;

        if let Some(parent) = paths.cache_db.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let cache = match MetadataCache::open(&paths.cache_db) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(
                    "Catalog cache {} unusable ({}), using an in-memory cache",
                    paths.cache_db, e
                );
                MetadataCache::in_memory()?
            }
        };

        Ok(Self::new(
            repository,
            cache,
            LocalLedger::new(paths.ledger_file.as_std_path()),
            loader,
            paths.plugins_dir.as_std_path(),
            config.host.sdk_version.clone(),
        ))
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `id` busy until the returned guard drops
    pub(crate) fn begin(&self, id: PluginId) -> Result<BusyGuard<'_>> {
        if !self.state().busy.insert(id) {
            return Err(ManagerError::Busy(id));
        }
        Ok(BusyGuard { manager: self, id })
    }

    pub(crate) fn emit(&self, event: ManagerEvent) {
        debug!("Emitting {}", event.kind());
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub(crate) fn emit_error(&self, err: &ManagerError) {
        self.emit(ManagerEvent::Error {
            message: err.to_string(),
            fatal: err.is_fatal(),
        });
    }

    /// Subscribe to manager notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.events.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state().connection
    }

    /// Host SDK version plugins must be built for
    pub fn sdk_version(&self) -> &str {
        &self.sdk_version
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    /// Snapshot of every tracked plugin, ordered by id
    pub fn plugins(&self) -> Vec<Plugin> {
        self.state().plugins.values().cloned().collect()
    }

    pub fn plugin(&self, id: PluginId) -> Option<Plugin> {
        self.state().plugins.get(&id).cloned()
    }

    pub(crate) fn require_plugin(&self, id: PluginId) -> Result<()> {
        if self.state().plugins.contains_key(&id) {
            Ok(())
        } else {
            Err(ManagerError::UnknownPlugin(id))
        }
    }

    /// Rewrite the ledger from current state
    pub(crate) fn save_ledger(&self) -> Result<()> {
        let _writing = self
            .ledger_write
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entries: Vec<_> = self
            .state()
            .plugins
            .values()
            .filter_map(Plugin::to_ledger_entry)
            .collect();
        self.ledger.save(&entries)
    }

    /// Sync the catalog from the repository, then reconcile.
    ///
    /// Without `force`, an established connection is reused and only the
    /// local reconciliation runs. On failure local state is still
    /// reconciled so installed plugins stay usable offline.
    pub async fn connect(&self, force: bool) -> Result<()> {
        let sync = {
            let mut state = self.state();
            match state.connection {
                ConnectionState::ClientTooOld => None,
                ConnectionState::Connected | ConnectionState::Connecting if !force => Some(false),
                _ => {
                    state.connection = ConnectionState::Connecting;
                    Some(true)
                }
            }
        };

        let Some(sync) = sync else {
            let err = ManagerError::Repository(RepositoryError::ClientTooOld);
            self.emit_error(&err);
            return Err(err);
        };
        if !sync {
            return self.read_database();
        }

        info!("Connecting to plugin repository {}", self.repository.api_base());
        match self.sync_catalog().await {
            Ok(()) => {
                self.state().connection = ConnectionState::Connected;
                info!("Plugin catalog synchronized");
                self.read_database()
            }
            Err(e) => {
                self.state().connection = if e.is_fatal() {
                    ConnectionState::ClientTooOld
                } else {
                    ConnectionState::Failed
                };
                error!("Failed to connect to plugin repository: {}", e);
                self.emit_error(&e);
                if let Err(local) = self.read_database() {
                    warn!("Offline reconciliation incomplete: {}", local);
                }
                Err(e)
            }
        }
    }

    async fn sync_catalog(&self) -> Result<()> {
        let schema = self.repository.fetch_schema().await?;
        self.cache.init(&schema)?;
        let tables = self.repository.fetch_catalog_tables().await?;
        self.cache.apply(&tables)?;
        Ok(())
    }

    fn catalog_details(&self, id: PluginId) -> CatalogDetails {
        if id < 0 {
            return CatalogDetails {
                tags: Vec::new(),
                publications: Vec::new(),
                versions: Vec::new(),
            };
        }
        CatalogDetails {
            tags: self.cache.list_tags(id),
            publications: self.cache.list_publications(id),
            versions: self.cache.list_versions_for_sdk(id, &self.sdk_version),
        }
    }

    /// Pull the catalog from the cache, reconcile with the loader and
    /// recompute every status.
    ///
    /// A plugin whose versions cannot be compared keeps its previous
    /// status; the first such error is reported and returned after all
    /// other plugins are updated.
    pub fn read_database(&self) -> Result<()> {
        let records = self.cache.list_plugins();
        let instances = self.loader.loaded_instances();

        let ids: Vec<PluginId> = {
            let mut state = self.state();
            for record in records {
                let plugin = state
                    .plugins
                    .entry(record.id)
                    .or_insert_with(|| Plugin::new(record.id));
                plugin.name = record.name;
                plugin.owner = record.owner;
                plugin.description = record.description;
                plugin.source_url = record.source_url;
                plugin.image_data = record.image_data;
                plugin.downloads = record.downloads;
            }
            reconcile_loaded(&mut state.plugins, &instances);
            state.plugins.keys().copied().collect()
        };

        let details: HashMap<PluginId, CatalogDetails> = ids
            .iter()
            .map(|&id| (id, self.catalog_details(id)))
            .collect();

        let mut first_error = None;
        {
            let mut state = self.state();
            let ManagerState { plugins, busy, .. } = &mut *state;
            for (id, plugin) in plugins.iter_mut() {
                let Some(detail) = details.get(id) else {
                    continue;
                };
                if *id >= 0 {
                    plugin.tags = detail.tags.clone();
                    plugin.publications = detail.publications.clone();
                }
                if busy.contains(id) && plugin.status == PluginStatus::Downloading {
                    continue;
                }
                let inputs = StatusInputs::for_plugin(plugin, &self.sdk_version, &detail.versions);
                match derive_status(&inputs) {
                    Ok(status) => plugin.status = status,
                    Err(e) => {
                        warn!("Cannot determine status of plugin {}: {}", id, e);
                        first_error.get_or_insert(e);
                    }
                }
            }
        }

        info!("Plugin catalog ready");
        self.emit(ManagerEvent::PluginsReady);

        match first_error {
            Some(e) => {
                let err = ManagerError::from(e);
                self.emit_error(&err);
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Recompute one plugin's status. On error the previous status stays.
    pub fn refresh_status(&self, id: PluginId) -> Result<PluginStatus> {
        let versions = if id < 0 {
            Vec::new()
        } else {
            self.cache.list_versions_for_sdk(id, &self.sdk_version)
        };

        let mut state = self.state();
        let plugin = state
            .plugins
            .get_mut(&id)
            .ok_or(ManagerError::UnknownPlugin(id))?;
        let status = derive_status(&StatusInputs::for_plugin(plugin, &self.sdk_version, &versions))?;
        plugin.status = status;
        Ok(status)
    }

    /// Recompute status, logging rather than returning failures
    pub(crate) fn refresh_status_logged(&self, id: PluginId) {
        if let Err(e) = self.refresh_status(id) {
            warn!("Cannot determine status of plugin {}: {}", id, e);
            self.emit_error(&e);
        }
    }

    /// Load an installed plugin into the process
    pub fn load_plugin(&self, id: PluginId) -> Result<()> {
        let _guard = self.begin(id)?;
        let result = self.load_unguarded(id);
        if let Err(e) = &result {
            warn!("Failed to load plugin {}: {}", id, e);
            self.emit_error(e);
        }
        result
    }

    pub(crate) fn load_unguarded(&self, id: PluginId) -> Result<()> {
        let path = {
            let state = self.state();
            let plugin = state.plugins.get(&id).ok_or(ManagerError::UnknownPlugin(id))?;
            if plugin.loaded {
                return Ok(());
            }
            plugin
                .main_file_path()
                .map(Path::to_path_buf)
                .ok_or(ManagerError::NotInstalled(id))?
        };

        let handle = self.loader.load_library(&path)?;
        if let Some(plugin) = self.state().plugins.get_mut(&id) {
            plugin.mark_loaded(handle);
        }
        info!("Loaded plugin {} ({})", id, handle);
        self.emit(ManagerEvent::PluginUpdated { id });
        Ok(())
    }

    /// Unload a loaded plugin
    pub fn unload_plugin(&self, id: PluginId) -> Result<()> {
        let _guard = self.begin(id)?;
        let result = self.unload_unguarded(id);
        if let Err(e) = &result {
            warn!("Failed to unload plugin {}: {}", id, e);
            self.emit_error(e);
        }
        result
    }

    pub(crate) fn unload_unguarded(&self, id: PluginId) -> Result<()> {
        let path = {
            let state = self.state();
            let plugin = state.plugins.get(&id).ok_or(ManagerError::UnknownPlugin(id))?;
            if !plugin.loaded {
                return Err(ManagerError::NotLoaded(id));
            }
            plugin
                .main_file_path()
                .map(Path::to_path_buf)
                .ok_or(ManagerError::NotInstalled(id))?
        };

        self.loader.unload_library(&path)?;
        if let Some(plugin) = self.state().plugins.get_mut(&id) {
            plugin.mark_unloaded();
        }
        info!("Unloaded plugin {}", id);
        self.emit(ManagerEvent::PluginUpdated { id });
        Ok(())
    }

    /// Load every installed plugin that is not loaded yet. Returns the ids
    /// that failed; each failure is also reported as an event.
    pub fn load_all_plugins(&self) -> Vec<PluginId> {
        let pending: Vec<PluginId> = self
            .state()
            .plugins
            .values()
            .filter(|p| p.local_copy && !p.loaded)
            .map(|p| p.id)
            .collect();

        pending
            .into_iter()
            .filter(|&id| self.load_plugin(id).is_err())
            .collect()
    }

    /// Ids of catalog plugins matching `term` in name, owner, description
    /// or tags
    pub fn search(&self, term: &str) -> HashSet<PluginId> {
        self.cache.search(term)
    }

    /// Every tag in the catalog
    pub fn all_tags(&self) -> Vec<String> {
        self.cache.all_tags()
    }

    /// Whether a catalog plugin already uses `name`
    pub fn is_name_in_use(&self, name: &str) -> bool {
        self.cache.is_name_in_use(name)
    }

    /// Plugins a model needs that are not loaded.
    ///
    /// Names the catalog knows come back with their catalog id; unknown
    /// names get a negative id and must be located by hand.
    pub fn find_missing(&self, required: &[String]) -> Vec<(PluginId, String)> {
        let state = self.state();
        required
            .iter()
            .filter(|name| {
                !state
                    .plugins
                    .values()
                    .any(|p| p.loaded && p.name.eq_ignore_ascii_case(name))
            })
            .map(|name| {
                let id = state
                    .plugins
                    .values()
                    .find(|p| p.id > 0 && p.name.eq_ignore_ascii_case(name))
                    .map(|p| p.id)
                    .unwrap_or(-1);
                (id, name.clone())
            })
            .collect()
    }

    /// Submit plugin metadata; emits `ReadyForImageUpload` with the token
    pub async fn request_upload_slot(&self, request: &SubmissionRequest) -> Result<String> {
        match self.repository.request_upload_slot(request).await {
            Ok(token) => {
                self.emit(ManagerEvent::ReadyForImageUpload {
                    token: token.clone(),
                });
                Ok(token)
            }
            Err(e) => {
                let err = ManagerError::from(e);
                self.emit_error(&err);
                Err(err)
            }
        }
    }

    /// Upload the submission image; emits `UploadFinished`
    pub async fn upload_image(&self, token: &str, image: &Path) -> Result<String> {
        match self.repository.upload_image(token, image).await {
            Ok(message) => {
                self.emit(ManagerEvent::UploadFinished {
                    message: message.clone(),
                });
                Ok(message)
            }
            Err(e) => {
                let err = ManagerError::from(e);
                self.emit_error(&err);
                Err(err)
            }
        }
    }

    /// Abandon a pending submission
    pub async fn cancel_upload(&self) -> Result<()> {
        self.repository.cancel_upload().await?;
        Ok(())
    }
}
