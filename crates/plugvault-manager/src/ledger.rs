//! Installed-plugin ledger
//!
//! A single JSON document listing every plugin that has files on disk. It is
//! the only durable install record: the catalog cache can be wiped at any
//! time without losing track of what is installed.

use crate::error::Result;
use fs4::fs_std::FileExt;
use plugvault_core::LedgerEntry;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk shape of the ledger file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default)]
    pub plugins: Vec<LedgerEntry>,
}

/// Ledger stored at a fixed path
pub struct LocalLedger {
    ledger_path: PathBuf,
}

impl LocalLedger {
    /// Create ledger from custom path
    pub fn new(ledger_path: impl Into<PathBuf>) -> Self {
        Self {
            ledger_path: ledger_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.ledger_path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.ledger_path.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.ledger_path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Read every entry. A missing or unreadable ledger is treated as empty.
    pub fn load(&self) -> Vec<LedgerEntry> {
        let content = match fs::read_to_string(&self.ledger_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No ledger at {}", self.ledger_path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read ledger {}: {}", self.ledger_path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<LedgerDocument>(&content) {
            Ok(document) => document.plugins,
            Err(e) => {
                warn!(
                    "Ignoring unreadable ledger {}: {}",
                    self.ledger_path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Replace the ledger with `entries` (atomic, file-locked)
    pub fn save(&self, entries: &[LedgerEntry]) -> Result<()> {
        if let Some(parent) = self.ledger_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let document = LedgerDocument {
            plugins: entries.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        // Writers serialize on a sidecar lock so the rename below never
        // races another writer's temp file
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        lock_file.lock_exclusive()?;

        let temp_path = self.temp_path();
        {
            let mut temp_file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&temp_path)?;
            temp_file.write_all(json.as_bytes())?;
            temp_file.sync_all()?;
        }
        fs::rename(&temp_path, &self.ledger_path)?;

        debug!(
            "Wrote {} ledger entries to {}",
            entries.len(),
            self.ledger_path.display()
        );
        // Lock is released when `lock_file` is dropped
        Ok(())
    }
}
