//! Test fixtures: a plugin manager over a mock repository
//!
//! Each [`TestEnv`] owns a wiremock server, a temp directory holding the
//! ledger and plugin files, and a [`MockLoader`].

use super::constants::*;
use super::mocks::MockLoader;
use plugvault_cache::MetadataCache;
use plugvault_core::types::{NetworkConfig, RepositoryConfig};
use plugvault_core::{LedgerEntry, LedgerFile, PluginId};
use plugvault_manager::{LocalLedger, ManagerEvent, NativeLoader, PluginManager};
use plugvault_repository::RepositoryClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestEnv {
    pub server: MockServer,
    pub dir: TempDir,
    pub loader: Arc<MockLoader>,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            dir: TempDir::new().unwrap(),
            loader: Arc::new(MockLoader::new()),
        }
    }

    /// Environment whose repository already serves the catalog
    pub async fn with_catalog() -> Self {
        let env = Self::new().await;
        mock_catalog(&env.server).await;
        env
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.dir.path().join("plugins")
    }

    pub fn plugin_dir(&self, id: PluginId) -> PathBuf {
        self.plugins_dir().join(id.to_string())
    }

    pub fn ledger(&self) -> LocalLedger {
        LocalLedger::new(self.dir.path().join("plugins.json"))
    }

    /// A fresh manager over this environment, reading the ledger as it is
    /// on disk now
    pub fn manager(&self) -> PluginManager {
        let repository = RepositoryConfig {
            base_url: self.server.uri(),
            api_path: API_PATH.to_string(),
        };
        let client = RepositoryClient::new(&repository, &NetworkConfig::default()).unwrap();
        let loader: Arc<dyn NativeLoader> = self.loader.clone();

        PluginManager::new(
            client,
            MetadataCache::in_memory().unwrap(),
            self.ledger(),
            loader,
            self.plugins_dir(),
            SDK_VERSION,
        )
    }

    /// Write a plugin file under the plugins directory
    pub fn write_plugin_file(&self, id: PluginId, name: &str) -> PathBuf {
        let dir = self.plugin_dir(id);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, FAKE_LIBRARY_CONTENT).unwrap();
        path
    }

    /// Put HeartFlow 1.2 on disk and in the ledger, built before the
    /// catalog's rebuild of the same version
    pub fn install_heart(&self) -> PathBuf {
        let main = self.write_plugin_file(HEART_ID, "libheartflow.so");
        self.ledger()
            .save(&[installed_entry(HEART_ID, "1.2", &[(main.as_path(), true)])])
            .unwrap();
        main
    }
}

/// Ledger record for an installed plugin
pub fn installed_entry(id: PluginId, version: &str, files: &[(&Path, bool)]) -> LedgerEntry {
    LedgerEntry {
        id,
        name: String::new(),
        version: version.to_string(),
        sdk_version: SDK_VERSION.to_string(),
        timestamp: HEART_INSTALLED_TIMESTAMP,
        files: files
            .iter()
            .map(|(path, is_main)| LedgerFile {
                path: path.to_path_buf(),
                is_main: *is_main,
            })
            .collect(),
    }
}

fn endpoint(name: &str) -> String {
    format!("{}/{}", API_PREFIX, name)
}

/// Serve the catalog schema and tables
pub async fn mock_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(endpoint("schema")))
        .respond_with(ResponseTemplate::new(200).set_body_string(SCHEMA_DDL))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(endpoint("tables")))
        .respond_with(ResponseTemplate::new(200).set_body_string(TABLES_JSON))
        .mount(server)
        .await;
}

/// One file in a chained plugin download
pub struct MockFile<'a> {
    pub index: u32,
    pub name: &'a str,
    pub next: Option<u32>,
    pub is_main: bool,
}

fn file_response(plugin_id: PluginId, file: &MockFile<'_>) -> ResponseTemplate {
    let mut response = ResponseTemplate::new(200)
        .set_body_bytes(FAKE_LIBRARY_CONTENT.to_vec())
        .insert_header("filename", file.name)
        .insert_header("pluginId", plugin_id.to_string().as_str())
        .insert_header("version", "1.2")
        .insert_header("sdkVersion", SDK_VERSION)
        .insert_header("isMainFile", if file.is_main { "1" } else { "0" })
        .insert_header("timestamp", "1700000000");
    if let Some(next) = file.next {
        response = response.insert_header("nextFileIndex", next.to_string().as_str());
    }
    response
}

/// Serve one plugin file, expecting exactly one request for it
pub async fn mock_plugin_file(server: &MockServer, plugin_id: PluginId, file: MockFile<'_>) {
    mock_plugin_file_delayed(server, plugin_id, file, Duration::ZERO).await;
}

/// Like [`mock_plugin_file`], answering only after `delay`
pub async fn mock_plugin_file_delayed(
    server: &MockServer,
    plugin_id: PluginId,
    file: MockFile<'_>,
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path(endpoint(&format!("plugins/{}", plugin_id))))
        .and(header("fileIndex", file.index.to_string().as_str()))
        .respond_with(file_response(plugin_id, &file).set_delay(delay))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer every request to `name` with a bare status code
pub async fn mock_status(server: &MockServer, http_method: &str, name: &str, status: u16) {
    Mock::given(method(http_method))
        .and(path(endpoint(name)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Everything already sitting in an event receiver
pub fn drain(events: &mut broadcast::Receiver<ManagerEvent>) -> Vec<ManagerEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
