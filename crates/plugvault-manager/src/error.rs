//! Error types for plugin lifecycle operations

use crate::loader::LoaderError;
use plugvault_cache::CacheError;
use plugvault_core::{PluginId, VersionError};
use plugvault_repository::RepositoryError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by [`crate::PluginManager`]
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Plugin {0} is busy with another operation")]
    Busy(PluginId),

    #[error("Unknown plugin {0}")]
    UnknownPlugin(PluginId),

    #[error("Plugin {0} is not in the repository")]
    NotInRepository(PluginId),

    #[error("Plugin {0} has no release for SDK {1}")]
    Unavailable(PluginId, String),

    #[error("Plugin {0} is not a local plugin")]
    NotLocal(PluginId),

    #[error("Plugin {0} has no files installed")]
    NotInstalled(PluginId),

    #[error("Plugin {0} is not loaded")]
    NotLoaded(PluginId),

    #[error("Failed to remove {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Catalog cache error: {0}")]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("Failed to serialize ledger: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ManagerError {
    /// Whether the error ends repository access for the session
    pub fn is_fatal(&self) -> bool {
        matches!(self, ManagerError::Repository(e) if e.is_fatal())
    }
}

pub type Result<T> = std::result::Result<T, ManagerError>;
