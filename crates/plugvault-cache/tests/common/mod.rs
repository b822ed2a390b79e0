//! Shared fixtures for catalog cache tests

#![allow(dead_code)]

use plugvault_cache::{BulkUpdate, MetadataCache, TableUpdate};

/// Schema in the shape the repository serves it
pub const SCHEMA: &str = r#"
CREATE TABLE users (ID INTEGER PRIMARY KEY, username TEXT);
CREATE TABLE plugins (ID INTEGER PRIMARY KEY, name TEXT, owner INTEGER, description TEXT, sourceURL TEXT, imageData TEXT, downloads INTEGER);
CREATE TABLE tags (ID INTEGER PRIMARY KEY, tag TEXT);
CREATE TABLE pluginTags (plugin INTEGER, tag INTEGER);
CREATE TABLE publications (ID INTEGER PRIMARY KEY, title TEXT, authors TEXT, journal TEXT, year TEXT, DOI TEXT);
CREATE TABLE pluginPubs (plugin INTEGER, publication INTEGER);
CREATE TABLE pluginVersions (ID INTEGER PRIMARY KEY, plugin INTEGER, version TEXT, sdkVersion TEXT, timestamp INTEGER);
"#;

pub fn table(name: &str, columns: &[&str], values: &str) -> TableUpdate {
    TableUpdate {
        name: name.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values: values.to_string(),
    }
}

/// A small catalog: a heart model, a muscle solver and a mesh tool
pub fn sample_catalog() -> BulkUpdate {
    BulkUpdate(vec![
        table("users", &["ID", "username"], "(1,'alice'),(2,'bob')"),
        table(
            "plugins",
            &["ID", "name", "owner", "description", "sourceURL", "imageData", "downloads"],
            "(42,'HeartFlow',1,'Cardiac flow model','https://git.example/heart','aGVhcnQ=',10),\
             (77,'MuscleSolver',2,'Hill-type muscle','',NULL,3),\
             (90,'MeshTools',2,'Remeshing helpers for 50% cases','',NULL,0)",
        ),
        table("tags", &["ID", "tag"], "(1,'biomechanics'),(2,'cfd'),(3,'mesh')"),
        table("pluginTags", &["plugin", "tag"], "(42,1),(42,2),(77,1),(90,3)"),
        table(
            "publications",
            &["ID", "title", "authors", "journal", "year", "DOI"],
            "(5,'Flow in the heart','A. Smith','J. Biomech','2021','10.1/abc')",
        ),
        table("pluginPubs", &["plugin", "publication"], "(42,5)"),
        table(
            "pluginVersions",
            &["ID", "plugin", "version", "sdkVersion", "timestamp"],
            "(1,42,'1.2','4.9.0',1700000000),(2,42,'1.3','5.0.0',1710000000),(3,77,'2.0','4.8.0',1690000000)",
        ),
    ])
}

pub fn loaded_cache() -> MetadataCache {
    let cache = MetadataCache::in_memory().unwrap();
    cache.init(SCHEMA).unwrap();
    cache.apply(&sample_catalog()).unwrap();
    cache
}
