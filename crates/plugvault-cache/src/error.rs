//! Error types for the catalog cache

use thiserror::Error;

/// Errors raised by the cache backing store
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cache connection lock poisoned")]
    LockPoisoned,

    #[error("Invalid catalog update for table '{table}': {reason}")]
    InvalidUpdate { table: String, reason: String },
}

pub type Result<T> = std::result::Result<T, CacheError>;
