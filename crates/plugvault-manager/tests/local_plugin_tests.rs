//! Local plugin and load/unload integration tests
//!
//! Tests plugins the repository does not track, plus explicit loading:
//! - Side-loading from an arbitrary path
//! - Repointing a local plugin at a new copy
//! - Forgetting local plugins
//! - Startup loading of everything installed

mod common;

use common::*;
use plugvault_core::PluginStatus;
use plugvault_manager::{LoaderError, ManagerError, NativeLoader};
use std::path::PathBuf;

fn library(env: &TestEnv, dir: &str, name: &str) -> PathBuf {
    let dir = env.dir.path().join(dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, FAKE_LIBRARY_CONTENT).unwrap();
    path.canonicalize().unwrap()
}

#[tokio::test]
async fn test_load_non_repo_plugin() {
    let env = TestEnv::new().await;
    let path = library(&env, "lab", "libgait.so");
    let manager = env.manager();

    let id = manager.load_non_repo_plugin(&path).unwrap();

    assert_eq!(id, -1);
    let plugin = manager.plugin(id).unwrap();
    assert!(plugin.loaded);
    assert!(plugin.allocator_id.is_some());
    assert_eq!(plugin.status, PluginStatus::Local);
    assert_eq!(plugin.name, "libgait");
    assert!(env.loader.is_loaded(&path));

    let entries = env.ledger().load();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, -1);
    assert_eq!(entries[0].name, "libgait");
}

#[tokio::test]
async fn test_same_file_name_repoints_existing_plugin() {
    let env = TestEnv::new().await;
    let old = library(&env, "build-a", "libgait.so");
    let new = library(&env, "build-b", "libgait.so");
    let manager = env.manager();

    let first = manager.load_non_repo_plugin(&old).unwrap();
    let second = manager.load_non_repo_plugin(&new).unwrap();

    assert_eq!(first, second);
    assert_eq!(manager.plugins().len(), 1);
    assert_eq!(
        manager.plugin(second).unwrap().main_file_path(),
        Some(new.as_path())
    );
    assert!(!env.loader.is_loaded(&old));
    assert!(env.loader.is_loaded(&new));
}

#[tokio::test]
async fn test_distinct_local_plugins_get_distinct_ids() {
    let env = TestEnv::new().await;
    let gait = library(&env, "lab", "libgait.so");
    let grip = library(&env, "lab", "libgrip.so");
    let manager = env.manager();

    let a = manager.load_non_repo_plugin(&gait).unwrap();
    let b = manager.load_non_repo_plugin(&grip).unwrap();

    assert_eq!((a, b), (-1, -2));
}

#[tokio::test]
async fn test_missing_local_file() {
    let env = TestEnv::new().await;
    let manager = env.manager();

    let err = manager
        .load_non_repo_plugin(&env.dir.path().join("nope.so"))
        .unwrap_err();

    assert!(matches!(err, ManagerError::Loader(LoaderError::MissingFile(_))));
    assert!(manager.plugins().is_empty());
}

#[tokio::test]
async fn test_failed_local_load_is_not_tracked() {
    let env = TestEnv::new().await;
    let path = library(&env, "lab", "libbroken.so");
    env.loader.fail_on(&path);
    let manager = env.manager();

    let err = manager.load_non_repo_plugin(&path).unwrap_err();

    assert!(matches!(err, ManagerError::Loader(LoaderError::LoadFailed { .. })));
    assert!(manager.plugins().is_empty());
    assert!(env.ledger().load().is_empty());
}

#[tokio::test]
async fn test_remove_local_plugin_keeps_files() {
    let env = TestEnv::new().await;
    let path = library(&env, "lab", "libgait.so");
    let manager = env.manager();
    let id = manager.load_non_repo_plugin(&path).unwrap();

    manager.remove_local_plugin(id).unwrap();

    assert!(manager.plugin(id).is_none());
    assert!(!env.loader.is_loaded(&path));
    assert!(path.exists());
    assert!(env.ledger().load().is_empty());
}

#[tokio::test]
async fn test_remove_local_plugin_rejects_catalog_ids() {
    let env = TestEnv::new().await;
    env.install_heart();
    let manager = env.manager();

    assert!(matches!(
        manager.remove_local_plugin(HEART_ID),
        Err(ManagerError::NotLocal(HEART_ID))
    ));
    assert!(matches!(
        manager.remove_local_plugin(-9),
        Err(ManagerError::UnknownPlugin(-9))
    ));
}

#[tokio::test]
async fn test_load_and_unload() {
    let env = TestEnv::new().await;
    let main = env.install_heart();
    let manager = env.manager();

    manager.load_plugin(HEART_ID).unwrap();
    assert!(manager.plugin(HEART_ID).unwrap().loaded);
    assert!(env.loader.is_loaded(&main));

    // Loading twice is a no-op
    manager.load_plugin(HEART_ID).unwrap();
    assert_eq!(env.loader.load_calls().len(), 1);

    manager.unload_plugin(HEART_ID).unwrap();
    let heart = manager.plugin(HEART_ID).unwrap();
    assert!(!heart.loaded);
    assert_eq!(heart.allocator_id, None);
    assert!(!env.loader.is_loaded(&main));

    assert!(matches!(
        manager.unload_plugin(HEART_ID),
        Err(ManagerError::NotLoaded(HEART_ID))
    ));
}

#[tokio::test]
async fn test_load_uninstalled_plugin_fails() {
    let env = TestEnv::with_catalog().await;
    let manager = env.manager();
    manager.connect(false).await.unwrap();

    assert!(matches!(
        manager.load_plugin(MESH_ID),
        Err(ManagerError::NotInstalled(MESH_ID))
    ));
}

#[tokio::test]
async fn test_load_all_plugins() {
    let env = TestEnv::new().await;
    let heart = env.install_heart();
    let gait = library(&env, "lab", "libgait.so");
    let local_id = env.manager().load_non_repo_plugin(&gait).unwrap();
    env.loader.fail_on(&heart);
    // Fresh process: the earlier manager's loads are forgotten
    env.loader.unload_library(&gait).unwrap();

    let manager = env.manager();
    let failed = manager.load_all_plugins();

    assert_eq!(failed, vec![HEART_ID]);
    assert!(manager.plugin(local_id).unwrap().loaded);
    assert!(!manager.plugin(HEART_ID).unwrap().loaded);
}
