//! Shared constants for manager tests

pub const API_PATH: &str = "api/v1.0/";
pub const API_PREFIX: &str = "/api/v1.0";

pub const SDK_VERSION: &str = "4.9.0";

/// Installed at 1.2, rebuilt later under the same version
pub const HEART_ID: i64 = 42;
/// Only released for an older SDK
pub const MUSCLE_ID: i64 = 77;
/// Current release, not installed
pub const MESH_ID: i64 = 90;

pub const SCHEMA_DDL: &str = r#"
CREATE TABLE users (ID INTEGER PRIMARY KEY, username TEXT);
CREATE TABLE plugins (ID INTEGER PRIMARY KEY, name TEXT, owner INTEGER, description TEXT, sourceURL TEXT, imageData TEXT, downloads INTEGER);
CREATE TABLE tags (ID INTEGER PRIMARY KEY, tag TEXT);
CREATE TABLE pluginTags (plugin INTEGER, tag INTEGER);
CREATE TABLE publications (ID INTEGER PRIMARY KEY, title TEXT, authors TEXT, journal TEXT, year TEXT, DOI TEXT);
CREATE TABLE pluginPubs (plugin INTEGER, publication INTEGER);
CREATE TABLE pluginVersions (ID INTEGER PRIMARY KEY, plugin INTEGER, version TEXT, sdkVersion TEXT, timestamp INTEGER);
"#;

pub const TABLES_JSON: &str = r#"[
  {"name": "users", "columns": ["ID", "username"], "values": "(1,'alice'),(2,'bob')"},
  {"name": "plugins", "columns": ["ID", "name", "owner", "description", "sourceURL", "imageData", "downloads"],
   "values": "(42,'HeartFlow',1,'Cardiac flow model','https://git.example/heart',NULL,10),(77,'MuscleSolver',2,'Hill-type muscle','',NULL,3),(90,'MeshTools',2,'Remeshing helpers','',NULL,0)"},
  {"name": "tags", "columns": ["ID", "tag"], "values": "(1,'biomechanics'),(2,'cfd'),(3,'mesh')"},
  {"name": "pluginTags", "columns": ["plugin", "tag"], "values": "(42,1),(42,2),(77,1),(90,3)"},
  {"name": "publications", "columns": ["ID", "title", "authors", "journal", "year", "DOI"], "values": "(5,'Flow in the heart','A. Smith','J. Biomech','2021','10.1/abc')"},
  {"name": "pluginPubs", "columns": ["plugin", "publication"], "values": "(42,5)"},
  {"name": "pluginVersions", "columns": ["ID", "plugin", "version", "sdkVersion", "timestamp"],
   "values": "(1,42,'1.2','4.9.0',1700000000),(2,77,'2.0','4.8.0',1690000000),(3,90,'0.9','4.9.0',1650000000)"}
]"#;

/// Build time the ledger records for the installed heart plugin, older than
/// the catalog's rebuild of the same version
pub const HEART_INSTALLED_TIMESTAMP: i64 = 1_600_000_000;

pub const FAKE_LIBRARY_CONTENT: &[u8] = b"\x7fELF fake shared object for testing";
