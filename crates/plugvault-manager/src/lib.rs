//! Plugin lifecycle management for plugvault
//!
//! This crate handles:
//! - Catalog synchronization and status derivation
//! - Chained multi-file plugin downloads
//! - Plugin removal and local (non-repository) plugins
//! - The durable install ledger
//! - Native loader reconciliation

pub mod error;
pub mod events;
mod install;
pub mod ledger;
pub mod loader;
pub mod manager;
pub mod status;

pub use error::{ManagerError, Result};
pub use events::ManagerEvent;
pub use ledger::{LedgerDocument, LocalLedger};
pub use loader::{LibraryLoader, LoadedInstance, LoaderError, NativeLoader};
pub use manager::{ConnectionState, PluginManager};
pub use status::{derive_status, StatusInputs};
