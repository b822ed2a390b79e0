//! Plugin domain types shared by the cache, repository and manager crates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Plugin identifier. Repository plugins have positive ids; plugins that
/// the repository does not track (loaded from an arbitrary file, or found
/// already loaded in the host) get negative ids.
pub type PluginId = i64;

/// Opaque handle correlating a tracked plugin with a live instance in the
/// native loader. The loader owns the instance; this is only a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllocatorId(pub u64);

impl fmt::Display for AllocatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Install status of a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    #[default]
    NotInstalled,
    Downloading,
    Broken,
    OutOfDate,
    UpToDate,
    Local,
    Unavailable,
}

impl PluginStatus {
    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            PluginStatus::NotInstalled => "Not Installed",
            PluginStatus::Downloading => "Downloading",
            PluginStatus::Broken => "Broken",
            PluginStatus::OutOfDate => "Out of Date",
            PluginStatus::UpToDate => "Up to Date",
            PluginStatus::Local => "Local Plugin",
            PluginStatus::Unavailable => "Unavailable",
        }
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A publication associated with a catalog plugin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

/// A catalog release compatible with the current host SDK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVersion {
    pub version: String,
    /// Release build time, unix seconds
    pub timestamp: i64,
}

/// One installed file as recorded in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerFile {
    pub path: PathBuf,
    #[serde(default)]
    pub is_main: bool,
}

/// Durable record of one installed plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: PluginId,
    /// Display name; the only identity a local plugin has
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub sdk_version: String,
    /// Build time of the installed release, unix seconds
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub files: Vec<LedgerFile>,
}

/// The central plugin entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plugin {
    pub id: PluginId,

    // Catalog fields, replaced wholesale on every sync
    pub name: String,
    pub owner: String,
    pub description: String,
    #[serde(skip)]
    pub image_data: Vec<u8>,
    pub downloads: u64,
    pub publications: Vec<Publication>,
    pub tags: Vec<String>,
    pub source_url: String,

    // Install and runtime fields
    pub local_copy: bool,
    pub loaded: bool,
    pub local_version: String,
    pub local_sdk_version: String,
    pub local_timestamp: i64,
    pub files: Vec<PathBuf>,
    pub main_file: Option<usize>,
    pub allocator_id: Option<AllocatorId>,
    pub status: PluginStatus,
}

impl Plugin {
    /// Create an empty entry for the given id
    pub fn new(id: PluginId) -> Self {
        let status = if id < 0 {
            PluginStatus::Local
        } else {
            PluginStatus::NotInstalled
        };
        Self {
            id,
            status,
            ..Default::default()
        }
    }

    /// Rebuild an installed plugin from its ledger record
    pub fn from_ledger(entry: &LedgerEntry) -> Self {
        let mut plugin = Self::new(entry.id);
        plugin.name = entry.name.clone();
        plugin.local_version = entry.version.clone();
        plugin.local_sdk_version = entry.sdk_version.clone();
        plugin.local_timestamp = entry.timestamp;
        // A record with no main flag is an interrupted download and stays
        // without an entry point
        for file in &entry.files {
            plugin.add_file(file.path.clone(), file.is_main);
        }
        plugin
    }

    /// Ledger record for this plugin, if it has files on disk
    pub fn to_ledger_entry(&self) -> Option<LedgerEntry> {
        if !self.local_copy {
            return None;
        }

        Some(LedgerEntry {
            id: self.id,
            name: if self.is_local() {
                self.name.clone()
            } else {
                String::new()
            },
            version: self.local_version.clone(),
            sdk_version: self.local_sdk_version.clone(),
            timestamp: self.local_timestamp,
            files: self
                .files
                .iter()
                .enumerate()
                .map(|(index, path)| LedgerFile {
                    path: path.clone(),
                    is_main: self.main_file == Some(index),
                })
                .collect(),
        })
    }

    /// Whether the repository does not track this plugin
    pub fn is_local(&self) -> bool {
        self.id < 0
    }

    /// Path handed to the native loader
    pub fn main_file_path(&self) -> Option<&Path> {
        self.main_file
            .and_then(|index| self.files.get(index))
            .map(PathBuf::as_path)
    }

    /// Record a file on disk. Marking a file main demotes any previous one.
    pub fn add_file(&mut self, path: PathBuf, is_main: bool) {
        self.files.push(path);
        if is_main {
            self.main_file = Some(self.files.len() - 1);
        }
        self.local_copy = true;
    }

    /// Mark the plugin as active in the native loader
    pub fn mark_loaded(&mut self, handle: AllocatorId) {
        self.loaded = true;
        self.allocator_id = Some(handle);
    }

    /// Mark the plugin as no longer active
    pub fn mark_unloaded(&mut self) {
        self.loaded = false;
        self.allocator_id = None;
    }

    /// Reset every install field to "not installed"
    pub fn clear_install(&mut self) {
        self.local_copy = false;
        self.mark_unloaded();
        self.local_version.clear();
        self.local_sdk_version.clear();
        self.local_timestamp = 0;
        self.files.clear();
        self.main_file = None;
    }

    /// File name of the main file, used to match local plugins
    pub fn main_file_name(&self) -> Option<&std::ffi::OsStr> {
        self.main_file_path().and_then(Path::file_name)
    }
}
