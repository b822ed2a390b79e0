//! Catalog synchronization integration tests
//!
//! Tests connecting to the repository and reconciling state:
//! - Status derivation against the synced catalog
//! - Native loader reconciliation
//! - Version gate (426) and offline behavior
//! - Catalog queries

mod common;

use common::*;
use plugvault_core::PluginStatus;
use plugvault_manager::{ConnectionState, ManagerError, ManagerEvent};
use plugvault_repository::RepositoryError;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_rebuilt_release_is_out_of_date() {
    let env = TestEnv::with_catalog().await;
    env.install_heart();
    let manager = env.manager();

    manager.connect(false).await.unwrap();

    assert_eq!(manager.connection_state(), ConnectionState::Connected);
    let heart = manager.plugin(HEART_ID).unwrap();
    assert_eq!(heart.status, PluginStatus::OutOfDate);
    assert_eq!(heart.name, "HeartFlow");
    assert_eq!(heart.owner, "alice");
    assert_eq!(heart.tags, vec!["biomechanics", "cfd"]);
    assert_eq!(heart.publications[0].title, "Flow in the heart");
    // Install fields are untouched by the sync
    assert_eq!(heart.local_version, "1.2");
    assert!(heart.local_copy);
}

#[tokio::test]
async fn test_plugin_without_release_for_sdk_is_unavailable() {
    let env = TestEnv::with_catalog().await;
    let manager = env.manager();

    manager.connect(false).await.unwrap();

    assert_eq!(
        manager.plugin(MUSCLE_ID).unwrap().status,
        PluginStatus::Unavailable
    );
    assert_eq!(
        manager.plugin(MESH_ID).unwrap().status,
        PluginStatus::NotInstalled
    );
}

#[tokio::test]
async fn test_missing_file_is_broken() {
    let env = TestEnv::with_catalog().await;
    let main = env.install_heart();
    std::fs::remove_file(&main).unwrap();
    let manager = env.manager();

    manager.connect(false).await.unwrap();

    assert_eq!(
        manager.plugin(HEART_ID).unwrap().status,
        PluginStatus::Broken
    );
}

#[tokio::test]
async fn test_connect_emits_plugins_ready() {
    let env = TestEnv::with_catalog().await;
    let manager = env.manager();
    let mut events = manager.subscribe();

    manager.connect(false).await.unwrap();

    assert!(drain(&mut events).contains(&ManagerEvent::PluginsReady));
}

#[tokio::test]
async fn test_connect_without_force_reuses_connection() {
    let env = TestEnv::new().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/schema", API_PREFIX)))
        .respond_with(ResponseTemplate::new(200).set_body_string(SCHEMA_DDL))
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/tables", API_PREFIX)))
        .respond_with(ResponseTemplate::new(200).set_body_string(TABLES_JSON))
        .expect(1)
        .mount(&env.server)
        .await;
    let manager = env.manager();

    manager.connect(false).await.unwrap();
    manager.connect(false).await.unwrap();

    assert_eq!(manager.plugins().len(), 3);
}

#[tokio::test]
async fn test_loader_instance_matches_installed_plugin() {
    let env = TestEnv::with_catalog().await;
    let main = env.install_heart();
    let handle = env.loader.preload(&main);
    let manager = env.manager();

    manager.connect(false).await.unwrap();

    let heart = manager.plugin(HEART_ID).unwrap();
    assert!(heart.loaded);
    assert_eq!(heart.allocator_id, Some(handle));
    assert!(manager.plugins().iter().all(|p| p.id >= 0));
}

#[tokio::test]
async fn test_unknown_loader_instance_becomes_one_local_plugin() {
    let env = TestEnv::with_catalog().await;
    let foreign = Path::new("/opt/lab/libforeign_solver.so");
    env.loader.preload(foreign);
    let manager = env.manager();

    manager.connect(false).await.unwrap();
    // A second pass must find the plugin it synthesized the first time
    manager.read_database().unwrap();

    let locals: Vec<_> = manager.plugins().into_iter().filter(|p| p.id < 0).collect();
    assert_eq!(locals.len(), 1);
    let local = &locals[0];
    assert_eq!(local.id, -1);
    assert!(local.loaded);
    assert_eq!(local.status, PluginStatus::Local);
    assert_eq!(local.name, "libforeign_solver");
    assert_eq!(local.main_file_path(), Some(foreign));
}

#[tokio::test]
async fn test_client_too_old_is_sticky() {
    let env = TestEnv::new().await;
    mock_status(&env.server, "GET", "schema", 426).await;
    let manager = env.manager();
    let mut events = manager.subscribe();

    let err = manager.connect(false).await.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(manager.connection_state(), ConnectionState::ClientTooOld);
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        ManagerEvent::Error { fatal: true, .. }
    )));

    let again = manager.connect(true).await.unwrap_err();
    assert!(matches!(
        again,
        ManagerError::Repository(RepositoryError::ClientTooOld)
    ));
    assert_eq!(env.server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unreachable_repository_still_reconciles() {
    let env = TestEnv::new().await;
    mock_status(&env.server, "GET", "schema", 503).await;
    let main = env.install_heart();
    env.loader.preload(&main);
    let manager = env.manager();
    let mut events = manager.subscribe();

    let err = manager.connect(false).await.unwrap_err();

    assert!(matches!(
        err,
        ManagerError::Repository(RepositoryError::Unavailable { status: 503 })
    ));
    assert!(!err.is_fatal());
    assert_eq!(manager.connection_state(), ConnectionState::Failed);
    assert!(manager.plugin(HEART_ID).unwrap().loaded);

    let seen = drain(&mut events);
    assert!(seen.iter().any(|e| matches!(e, ManagerEvent::Error { fatal: false, .. })));
    assert!(seen.contains(&ManagerEvent::PluginsReady));
}

#[tokio::test]
async fn test_failed_connection_can_be_retried() {
    let env = TestEnv::new().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/schema", API_PREFIX)))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&env.server)
        .await;
    mock_catalog(&env.server).await;
    let manager = env.manager();

    assert!(manager.connect(false).await.is_err());
    manager.connect(false).await.unwrap();

    assert_eq!(manager.connection_state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_catalog_queries() {
    let env = TestEnv::with_catalog().await;
    let manager = env.manager();
    manager.connect(false).await.unwrap();

    let found = manager.search("CARDIAC");
    assert_eq!(found.len(), 1);
    assert!(found.contains(&HEART_ID));
    assert!(manager.search("biomechanics").contains(&MUSCLE_ID));
    assert_eq!(manager.all_tags(), vec!["biomechanics", "cfd", "mesh"]);
    assert!(manager.is_name_in_use("heartflow"));
    assert!(!manager.is_name_in_use("LungFlow"));
}

#[tokio::test]
async fn test_find_missing_plugins() {
    let env = TestEnv::with_catalog().await;
    let main = env.install_heart();
    env.loader.preload(&main);
    let manager = env.manager();
    manager.connect(false).await.unwrap();

    let required = vec![
        "HeartFlow".to_string(),
        "meshtools".to_string(),
        "LungFlow".to_string(),
    ];
    let missing = manager.find_missing(&required);

    assert_eq!(
        missing,
        vec![(MESH_ID, "meshtools".to_string()), (-1, "LungFlow".to_string())]
    );
}
