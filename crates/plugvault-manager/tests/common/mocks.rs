//! Mock implementations for testing
//!
//! [`MockLoader`] stands in for the native loader so tests never touch real
//! shared libraries.

use plugvault_core::AllocatorId;
use plugvault_manager::{LoadedInstance, LoaderError, NativeLoader};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
struct MockLoaderState {
    next_handle: u64,
    loaded: Vec<LoadedInstance>,
    failing: HashSet<PathBuf>,
    load_calls: Vec<PathBuf>,
}

/// Native loader that keeps everything in memory
#[derive(Default)]
pub struct MockLoader {
    state: Mutex<MockLoaderState>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend something outside the manager already loaded `path`
    pub fn preload(&self, path: impl Into<PathBuf>) -> AllocatorId {
        let mut state = self.state.lock().unwrap();
        state.next_handle += 1;
        let handle = AllocatorId(state.next_handle);
        state.loaded.push(LoadedInstance {
            path: path.into(),
            handle,
        });
        handle
    }

    /// Make every load of `path` fail
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().failing.insert(path.into());
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.state
            .lock()
            .unwrap()
            .loaded
            .iter()
            .any(|i| i.path == path)
    }

    pub fn load_calls(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().load_calls.clone()
    }
}

impl NativeLoader for MockLoader {
    fn load_library(&self, path: &Path) -> Result<AllocatorId, LoaderError> {
        let mut state = self.state.lock().unwrap();
        state.load_calls.push(path.to_path_buf());

        if let Some(existing) = state.loaded.iter().find(|i| i.path == path) {
            return Ok(existing.handle);
        }
        if state.failing.contains(path) {
            return Err(LoaderError::LoadFailed {
                path: path.to_path_buf(),
                message: "mock load failure".to_string(),
            });
        }
        if !path.exists() {
            return Err(LoaderError::MissingFile(path.to_path_buf()));
        }

        state.next_handle += 1;
        let handle = AllocatorId(state.next_handle);
        state.loaded.push(LoadedInstance {
            path: path.to_path_buf(),
            handle,
        });
        Ok(handle)
    }

    fn unload_library(&self, path: &Path) -> Result<(), LoaderError> {
        let mut state = self.state.lock().unwrap();
        let before = state.loaded.len();
        state.loaded.retain(|i| i.path != path);
        if state.loaded.len() == before {
            return Err(LoaderError::NotLoaded(path.to_path_buf()));
        }
        Ok(())
    }

    fn loaded_instances(&self) -> Vec<LoadedInstance> {
        self.state.lock().unwrap().loaded.clone()
    }
}
