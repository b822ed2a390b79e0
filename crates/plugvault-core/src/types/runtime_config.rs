//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls where the repository
//! lives, how the HTTP client behaves, which host SDK the plugins must
//! target, and where installed files and caches are kept.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlugvaultConfig {
    /// Plugin repository endpoint
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Host application settings
    #[serde(default)]
    pub host: HostConfig,

    /// Filesystem locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Native loader settings
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Partially specified configuration, as read from a user config file.
///
/// Only sections present in the file replace the corresponding section of
/// the lower-precedence configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlugvaultConfigOverlay {
    pub repository: Option<RepositoryConfig>,
    pub network: Option<NetworkConfig>,
    pub host: Option<HostConfig>,
    pub paths: Option<PathsConfig>,
    pub loader: Option<LoaderConfig>,
}

/// Plugin repository endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryConfig {
    /// Scheme, host and port of the repository server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API prefix appended to the base URL
    #[serde(default = "default_api_path")]
    pub api_path: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_path: default_api_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://repo.plugvault.dev".to_string()
}
fn default_api_path() -> String {
    "api/v1.0/".to_string()
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Timeout for catalog and submission requests, in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Timeout for a single plugin file download, in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Skip TLS certificate validation (logged loudly when enabled)
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            download_timeout_secs: default_download_timeout(),
            user_agent: default_user_agent(),
            accept_invalid_certs: false,
        }
    }
}

fn default_http_timeout() -> u64 {
    60
}
fn default_download_timeout() -> u64 {
    600 // 10 minutes
}
fn default_user_agent() -> String {
    format!(
        "plugvault/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Host application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HostConfig {
    /// Plugin SDK version of the running host; only catalog releases built
    /// against exactly this version are installable
    #[serde(default = "default_sdk_version")]
    pub sdk_version: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sdk_version: default_sdk_version(),
        }
    }
}

fn default_sdk_version() -> String {
    "4.9.0".to_string()
}

/// Filesystem locations. Unset entries are derived from `data_dir`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathsConfig {
    /// Root directory for plugvault state (default: ~/.plugvault)
    #[serde(default)]
    pub data_dir: Option<Utf8PathBuf>,

    /// Directory holding downloaded plugin files (default: <data-dir>/plugins)
    #[serde(default)]
    pub plugins_dir: Option<Utf8PathBuf>,

    /// Installed-plugin ledger (default: <plugins-dir>/plugins.json)
    #[serde(default)]
    pub ledger_file: Option<Utf8PathBuf>,

    /// Catalog cache database (default: <data-dir>/catalog.db)
    #[serde(default)]
    pub cache_db: Option<Utf8PathBuf>,
}

/// Concrete filesystem locations after defaults are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub data_dir: Utf8PathBuf,
    pub plugins_dir: Utf8PathBuf,
    pub ledger_file: Utf8PathBuf,
    pub cache_db: Utf8PathBuf,
}

impl PathsConfig {
    /// Fill unset locations relative to `default_data_dir`
    pub fn resolve(&self, default_data_dir: &Utf8Path) -> ResolvedPaths {
        let data_dir = self
            .data_dir
            .clone()
            .unwrap_or_else(|| default_data_dir.to_owned());
        let plugins_dir = self
            .plugins_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("plugins"));
        let ledger_file = self
            .ledger_file
            .clone()
            .unwrap_or_else(|| plugins_dir.join("plugins.json"));
        let cache_db = self
            .cache_db
            .clone()
            .unwrap_or_else(|| data_dir.join("catalog.db"));

        ResolvedPaths {
            data_dir,
            plugins_dir,
            ledger_file,
            cache_db,
        }
    }
}

/// Native loader settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoaderConfig {
    /// Symbol a library must export to be accepted as a plugin
    #[serde(default)]
    pub entry_symbol: Option<String>,
}
