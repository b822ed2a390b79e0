//! Relational engine seam
//!
//! The cache talks to its store through plain SQL text so the same queries
//! work against any engine that can run them. Rows come back as optional
//! strings; callers parse what they need.

use crate::error::{CacheError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// One result row, one entry per selected column
pub type Row = Vec<Option<String>>;

/// Minimal SQL engine used by [`crate::MetadataCache`]
pub trait CacheEngine: Send + Sync {
    /// Drop every user table, then apply `ddl`
    fn reset_schema(&self, ddl: &str) -> Result<()>;

    /// Run one or more statements that return no rows
    fn execute(&self, sql: &str) -> Result<()>;

    /// Run a single query and collect its rows
    fn query(&self, sql: &str) -> Result<Vec<Row>>;
}

/// [`CacheEngine`] over a bundled SQLite connection
pub struct SqliteEngine {
    conn: Mutex<Connection>,
}

impl SqliteEngine {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!("Opened catalog cache at {}", path.as_ref().display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database, mostly for tests and offline runs
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| CacheError::LockPoisoned)?;
        f(&conn)
    }
}

fn value_to_string(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(BASE64.encode(b)),
    }
}

impl CacheEngine for SqliteEngine {
    fn reset_schema(&self, ddl: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tables: Vec<String> = {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                )?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                rows.collect::<std::result::Result<_, _>>()?
            };

            conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
            for table in &tables {
                debug!("Dropping cache table {}", table);
                let quoted = table.replace('"', "\"\"");
                conn.execute_batch(&format!("DROP TABLE IF EXISTS \"{}\";", quoted))?;
            }
            conn.execute_batch(ddl)?;
            Ok(())
        })
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(sql)?;
            Ok(())
        })
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let columns = stmt.column_count();
            let mut rows = stmt.query([])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(columns);
                for index in 0..columns {
                    values.push(value_to_string(row.get_ref(index)?));
                }
                out.push(values);
            }
            Ok(out)
        })
    }
}
