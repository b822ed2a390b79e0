//! Catalog cache for Plugvault
//!
//! Holds a local relational copy of the repository catalog: plugin records,
//! tags, publications and the per-SDK release table. The cache is rebuilt
//! wholesale on every successful sync and may be deleted at any time; the
//! installed-plugin ledger lives elsewhere.

pub mod bulk;
pub mod cache;
pub mod engine;
pub mod error;

pub use bulk::{BulkUpdate, TableUpdate};
pub use cache::{MetadataCache, PluginRecord};
pub use engine::{CacheEngine, Row, SqliteEngine};
pub use error::{CacheError, Result};
