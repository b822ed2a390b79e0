//! Native plugin loader seam
//!
//! The manager never touches dynamic libraries directly. It asks a
//! [`NativeLoader`] to load or unload a file and to report what is active,
//! and keeps only the returned [`AllocatorId`] handles.

use plugvault_core::AllocatorId;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by a native loader
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Plugin file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to load {}: {message}", .path.display())]
    LoadFailed { path: PathBuf, message: String },

    #[error("{} does not export entry symbol '{symbol}'", .path.display())]
    MissingEntry { path: PathBuf, symbol: String },

    #[error("{} is not loaded", .0.display())]
    NotLoaded(PathBuf),
}

/// A library the loader currently holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedInstance {
    pub path: PathBuf,
    pub handle: AllocatorId,
}

/// Loads plugin libraries into the running process
pub trait NativeLoader: Send + Sync {
    /// Load the library at `path`. Loading a path that is already loaded
    /// returns its existing handle.
    fn load_library(&self, path: &Path) -> Result<AllocatorId, LoaderError>;

    /// Unload the library at `path`
    fn unload_library(&self, path: &Path) -> Result<(), LoaderError>;

    /// Every library currently loaded, including ones loaded by other means
    fn loaded_instances(&self) -> Vec<LoadedInstance>;
}

struct LoadedLibrary {
    handle: AllocatorId,
    // Kept alive until unloaded
    _library: libloading::Library,
}

/// [`NativeLoader`] backed by `libloading`
pub struct LibraryLoader {
    entry_symbol: Option<String>,
    next_handle: AtomicU64,
    libraries: Mutex<HashMap<PathBuf, LoadedLibrary>>,
}

impl LibraryLoader {
    /// Create a loader. When `entry_symbol` is set, libraries that do not
    /// export it are rejected.
    pub fn new(entry_symbol: Option<String>) -> Self {
        Self {
            entry_symbol,
            next_handle: AtomicU64::new(1),
            libraries: Mutex::new(HashMap::new()),
        }
    }

    fn libraries(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, LoadedLibrary>> {
        self.libraries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for LibraryLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryLoader")
            .field("entry_symbol", &self.entry_symbol)
            .field("loaded", &self.libraries().len())
            .finish()
    }
}

impl NativeLoader for LibraryLoader {
    fn load_library(&self, path: &Path) -> Result<AllocatorId, LoaderError> {
        if let Some(existing) = self.libraries().get(path) {
            return Ok(existing.handle);
        }
        if !path.exists() {
            return Err(LoaderError::MissingFile(path.to_path_buf()));
        }

        // SAFETY: running a plugin's initializers is the point of loading
        // it; the file comes from the repository or was chosen by the user.
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
            LoaderError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        if let Some(symbol) = &self.entry_symbol {
            // SAFETY: the symbol is only looked up, never called here
            let found = unsafe { library.get::<unsafe extern "C" fn()>(symbol.as_bytes()) };
            if found.is_err() {
                return Err(LoaderError::MissingEntry {
                    path: path.to_path_buf(),
                    symbol: symbol.clone(),
                });
            }
        }

        let handle = AllocatorId(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.libraries().insert(
            path.to_path_buf(),
            LoadedLibrary {
                handle,
                _library: library,
            },
        );
        info!("Loaded plugin library {} as {}", path.display(), handle);
        Ok(handle)
    }

    fn unload_library(&self, path: &Path) -> Result<(), LoaderError> {
        match self.libraries().remove(path) {
            Some(loaded) => {
                debug!("Unloading plugin library {} ({})", path.display(), loaded.handle);
                Ok(())
            }
            None => Err(LoaderError::NotLoaded(path.to_path_buf())),
        }
    }

    fn loaded_instances(&self) -> Vec<LoadedInstance> {
        let mut instances: Vec<_> = self
            .libraries()
            .iter()
            .map(|(path, loaded)| LoadedInstance {
                path: path.clone(),
                handle: loaded.handle,
            })
            .collect();
        instances.sort_by_key(|i| i.handle);
        instances
    }
}
