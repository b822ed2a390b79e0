//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User config (~/.plugvault/config.yaml)
//! 3. Environment variables (PLUGVAULT_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{PlugvaultConfig, PlugvaultConfigOverlay, ResolvedPaths};
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Name of the user configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a new hierarchical config loader rooted at ~/.plugvault
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the standard config directory (~/.plugvault)
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = crate::utils::get_home_dir().map_err(|_| Error::NoHomeDir)?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|_| Error::invalid_config("Home directory path is not valid UTF-8"))?;

        Ok(home.join(".plugvault"))
    }

    /// Load configuration with hierarchical precedence
    pub fn load(&self) -> Result<PlugvaultConfig> {
        // Start with embedded defaults
        let mut config = Self::load_embedded_config::<PlugvaultConfig>("defaults.yaml")?;

        // Layer the user file on top if it exists
        let user_config_path = self.config_dir.join(CONFIG_FILE_NAME);
        if user_config_path.exists() {
            debug!("Loading user configuration from {}", user_config_path);
            let overlay = self.load_yaml_file::<PlugvaultConfigOverlay>(&user_config_path)?;
            config = Self::merge_config(config, overlay);
        }

        // Apply environment variable overrides
        config = self.apply_env_overrides(config)?;

        Ok(config)
    }

    /// Resolve filesystem locations, defaulting the data directory to the
    /// config directory
    pub fn resolve_paths(&self, config: &PlugvaultConfig) -> ResolvedPaths {
        config.paths.resolve(&self.config_dir)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        let config: T = serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })?;

        Ok(config)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let config: T = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        Ok(config)
    }

    /// Merge a user overlay into the base config (sections present in the
    /// overlay win)
    fn merge_config(base: PlugvaultConfig, overlay: PlugvaultConfigOverlay) -> PlugvaultConfig {
        PlugvaultConfig {
            repository: overlay.repository.unwrap_or(base.repository),
            network: overlay.network.unwrap_or(base.network),
            host: overlay.host.unwrap_or(base.host),
            paths: overlay.paths.unwrap_or(base.paths),
            loader: overlay.loader.unwrap_or(base.loader),
        }
    }

    /// Apply environment variable overrides to the config
    fn apply_env_overrides(&self, mut config: PlugvaultConfig) -> Result<PlugvaultConfig> {
        // Repository endpoint
        if let Ok(val) = env::var("PLUGVAULT_REPOSITORY_URL") {
            config.repository.base_url = val;
        }

        if let Ok(val) = env::var("PLUGVAULT_API_PATH") {
            config.repository.api_path = val;
        }

        // Network timeouts
        if let Ok(val) = env::var("PLUGVAULT_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("PLUGVAULT_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("PLUGVAULT_DOWNLOAD_TIMEOUT_SECS") {
            config.network.download_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("PLUGVAULT_DOWNLOAD_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("PLUGVAULT_ACCEPT_INVALID_CERTS") {
            config.network.accept_invalid_certs = val.parse().map_err(|_| {
                Error::invalid_config("PLUGVAULT_ACCEPT_INVALID_CERTS must be true or false")
            })?;
        }

        // Host SDK
        if let Ok(val) = env::var("PLUGVAULT_SDK_VERSION") {
            config.host.sdk_version = val;
        }

        // Paths
        if let Ok(val) = env::var("PLUGVAULT_DATA_DIR") {
            config.paths.data_dir = Some(Utf8PathBuf::from(val));
        }

        if let Ok(val) = env::var("PLUGVAULT_PLUGINS_DIR") {
            config.paths.plugins_dir = Some(Utf8PathBuf::from(val));
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
