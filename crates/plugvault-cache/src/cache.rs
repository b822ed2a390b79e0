//! Catalog queries over the cache engine
//!
//! Read operations never fail: a broken or missing cache is logged and
//! reads come back empty, so the manager keeps working offline from the
//! ledger alone.

use crate::bulk::BulkUpdate;
use crate::engine::{CacheEngine, Row, SqliteEngine};
use crate::error::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use plugvault_core::{CatalogVersion, PluginId, Publication};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// One catalog plugin row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginRecord {
    pub id: PluginId,
    pub name: String,
    pub owner: String,
    pub description: String,
    pub source_url: String,
    pub image_data: Vec<u8>,
    pub downloads: u64,
}

/// Local copy of the repository catalog
pub struct MetadataCache {
    engine: Box<dyn CacheEngine>,
}

/// Render a string as a SQL literal
fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a LIKE pattern matching `term` anywhere. Only ASCII is folded,
/// matching SQLite's `LOWER`.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .to_ascii_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    literal(&format!("%{}%", escaped))
}

fn text(row: &Row, index: usize) -> String {
    row.get(index).cloned().flatten().unwrap_or_default()
}

fn opt_text(row: &Row, index: usize) -> Option<String> {
    row.get(index).cloned().flatten().filter(|s| !s.is_empty())
}

fn number<T: std::str::FromStr>(row: &Row, index: usize) -> Option<T> {
    row.get(index)
        .and_then(|v| v.as_deref())
        .and_then(|v| v.trim().parse().ok())
}

impl MetadataCache {
    pub fn new(engine: impl CacheEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
        }
    }

    /// Cache stored in a SQLite file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(SqliteEngine::open(path)?))
    }

    /// Cache held in memory for the lifetime of the process
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(SqliteEngine::in_memory()?))
    }

    /// Throw away everything and apply the server schema
    pub fn init(&self, schema: &str) -> Result<()> {
        self.engine.reset_schema(schema).inspect_err(|e| {
            warn!("Failed to reset catalog cache schema: {}", e);
        })
    }

    /// Apply a catalog update table by table
    pub fn apply(&self, update: &BulkUpdate) -> Result<()> {
        for table in update.tables() {
            if table.is_empty() {
                debug!("Skipping empty catalog table {}", table.name);
                continue;
            }
            let sql = table.to_sql()?;
            self.engine.execute(&sql).inspect_err(|e| {
                warn!("Failed to update catalog table {}: {}", table.name, e);
            })?;
            debug!("Updated catalog table {}", table.name);
        }
        Ok(())
    }

    fn rows(&self, sql: &str) -> Vec<Row> {
        match self.engine.query(sql) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Catalog cache query failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Every catalog plugin, ordered by id
    pub fn list_plugins(&self) -> Vec<PluginRecord> {
        let rows = self.rows(
            "SELECT plugins.ID, plugins.name, users.username, plugins.description, \
             plugins.sourceURL, plugins.imageData, plugins.downloads \
             FROM plugins LEFT JOIN users ON plugins.owner = users.ID \
             ORDER BY plugins.ID",
        );

        rows.iter()
            .filter_map(|row| {
                let Some(id) = number::<PluginId>(row, 0) else {
                    warn!("Skipping catalog plugin with invalid id {:?}", row.first());
                    return None;
                };

                let image_data = match opt_text(row, 5) {
                    Some(encoded) => BASE64.decode(encoded.trim()).unwrap_or_else(|e| {
                        warn!("Plugin {} has an unreadable thumbnail: {}", id, e);
                        Vec::new()
                    }),
                    None => Vec::new(),
                };

                Some(PluginRecord {
                    id,
                    name: text(row, 1),
                    owner: text(row, 2),
                    description: text(row, 3),
                    source_url: text(row, 4),
                    image_data,
                    downloads: number(row, 6).unwrap_or(0),
                })
            })
            .collect()
    }

    /// Tags attached to a plugin, alphabetical
    pub fn list_tags(&self, plugin: PluginId) -> Vec<String> {
        self.rows(&format!(
            "SELECT tags.tag FROM pluginTags JOIN tags ON pluginTags.tag = tags.ID \
             WHERE pluginTags.plugin = {} ORDER BY tags.tag",
            plugin
        ))
        .iter()
        .filter_map(|row| opt_text(row, 0))
        .collect()
    }

    /// Publications attached to a plugin
    pub fn list_publications(&self, plugin: PluginId) -> Vec<Publication> {
        self.rows(&format!(
            "SELECT publications.title, publications.authors, publications.journal, \
             publications.year, publications.DOI \
             FROM pluginPubs JOIN publications ON pluginPubs.publication = publications.ID \
             WHERE pluginPubs.plugin = {} ORDER BY publications.ID",
            plugin
        ))
        .iter()
        .map(|row| Publication {
            title: text(row, 0),
            authors: opt_text(row, 1),
            journal: opt_text(row, 2),
            year: opt_text(row, 3),
            doi: opt_text(row, 4),
        })
        .collect()
    }

    /// Releases of a plugin built against exactly `sdk_version`.
    ///
    /// An empty result means the plugin has nothing installable for this
    /// host.
    pub fn list_versions_for_sdk(&self, plugin: PluginId, sdk_version: &str) -> Vec<CatalogVersion> {
        self.rows(&format!(
            "SELECT version, timestamp FROM pluginVersions \
             WHERE plugin = {} AND sdkVersion = {} ORDER BY ID",
            plugin,
            literal(sdk_version)
        ))
        .iter()
        .filter_map(|row| {
            let version = opt_text(row, 0)?;
            Some(CatalogVersion {
                version,
                timestamp: number(row, 1).unwrap_or(0),
            })
        })
        .collect()
    }

    /// Ids of plugins whose name, owner, description or tags contain
    /// `term`, ignoring case
    pub fn search(&self, term: &str) -> HashSet<PluginId> {
        if term.is_empty() {
            return HashSet::new();
        }

        let pattern = contains_pattern(term);
        let sql = format!(
            "SELECT plugins.ID FROM plugins LEFT JOIN users ON plugins.owner = users.ID \
             WHERE LOWER(plugins.name) LIKE {0} ESCAPE '\\' \
             OR LOWER(users.username) LIKE {0} ESCAPE '\\' \
             OR LOWER(plugins.description) LIKE {0} ESCAPE '\\' \
             UNION \
             SELECT pluginTags.plugin FROM pluginTags JOIN tags ON pluginTags.tag = tags.ID \
             WHERE LOWER(tags.tag) LIKE {0} ESCAPE '\\'",
            pattern
        );

        self.rows(&sql)
            .iter()
            .filter_map(|row| number::<PluginId>(row, 0))
            .collect()
    }

    /// Every tag known to the catalog, alphabetical
    pub fn all_tags(&self) -> Vec<String> {
        self.rows("SELECT tag FROM tags ORDER BY tag")
            .iter()
            .filter_map(|row| opt_text(row, 0))
            .collect()
    }

    /// Whether a catalog plugin already uses `name`, ignoring case
    pub fn is_name_in_use(&self, name: &str) -> bool {
        !self
            .rows(&format!(
                "SELECT 1 FROM plugins WHERE LOWER(name) = LOWER({}) LIMIT 1",
                literal(name)
            ))
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_escapes_quotes() {
        assert_eq!(literal("o'brien"), "'o''brien'");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_Mesh"), "'%50\\%\\_mesh%'");
    }

    #[test]
    fn test_reads_degrade_without_schema() {
        let cache = MetadataCache::in_memory().unwrap();
        assert!(cache.list_plugins().is_empty());
        assert!(cache.list_tags(1).is_empty());
        assert!(cache.search("mesh").is_empty());
        assert!(!cache.is_name_in_use("mesh"));
    }
}
