//! # plugvault-core
//!
//! Core library for Plugvault providing:
//! - Layered configuration loading (embedded defaults, user file, environment)
//! - Dotted version comparison used for update detection
//! - Plugin, ledger and catalog type definitions shared by every crate

pub mod config;
pub mod error;
pub mod types;
pub mod utils;
pub mod version;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::{
    AllocatorId, CatalogVersion, LedgerEntry, LedgerFile, Plugin, PluginId, PluginStatus,
    PlugvaultConfig, Publication, ResolvedPaths,
};
pub use utils::get_home_dir;
pub use version::{is_newer, VersionError};
