//! Shared constants for repository tests

/// Path prefix every endpoint lives under
pub const API_PATH: &str = "api/v1.0/";
pub const API_PREFIX: &str = "/api/v1.0";

pub const SCHEMA_DDL: &str =
    "CREATE TABLE plugins (ID INTEGER PRIMARY KEY, name TEXT, owner INTEGER, description TEXT, sourceURL TEXT, imageData TEXT, downloads INTEGER);";

pub const TABLES_JSON: &str = r#"[
  {"name": "plugins", "columns": ["ID", "name", "owner", "description", "sourceURL", "imageData", "downloads"], "values": "(42,'HeartFlow',1,'Cardiac flow','',NULL,10)"},
  {"name": "pluginTags", "columns": ["plugin", "tag"], "values": "(42,1)"}
]"#;

pub const HEART_PLUGIN_ID: i64 = 42;
pub const FAKE_LIBRARY_CONTENT: &[u8] = b"\x7fELF fake shared object for testing";
