//! Location discovery, setters and persistence, end to end.

#![cfg(unix)]

mod common;

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{FakeBackend, Harness};
use godcode::{EnvFileLocationStore, LocationStore, ResolverConfig, RuntimeLocation};
use serde_json::json;

fn fake_runtime(dir: &Path, name: &str, version: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\necho '{version}'\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn startup_picks_the_first_python3_candidate() {
    let bin = tempfile::tempdir().unwrap();
    fake_runtime(bin.path(), "python3", "Python 2.7.18");
    let python = fake_runtime(bin.path(), "python", "Python 3.11.4");
    let backend = FakeBackend::new("exit 0\n");

    let mut resolver = ResolverConfig::empty().with_search_path(bin.path());
    resolver.runtime_candidates = vec!["python3".into(), "python".into()];
    resolver.backend_candidates = vec![PathBuf::from("/nonexistent/backend"), backend.root().into()];

    let channel = Harness {
        resolver,
        ..Harness::default()
    }
    .started()
    .await;

    let location = channel.call("get-location", None).await.data.unwrap();
    let expected_runtime = std::fs::canonicalize(&python).unwrap();
    let expected_root = std::fs::canonicalize(backend.root()).unwrap();
    assert_eq!(location["runtimePath"], json!(expected_runtime));
    assert_eq!(location["backendRoot"], json!(expected_root));
}

#[tokio::test]
async fn failed_startup_discovery_is_reported_by_calls() {
    let bin = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new("exit 0\n");

    let mut resolver = ResolverConfig::empty().with_search_path(bin.path());
    resolver.runtime_candidates = vec!["python3".into(), "python".into()];
    resolver.backend_candidates = vec![backend.root().into()];

    let channel = Harness {
        resolver,
        ..Harness::default()
    }
    .started()
    .await;

    let envelope = channel.call("ping", None).await;
    assert_eq!(
        envelope.error.as_deref(),
        Some("runtime not found (tried: python3, python)")
    );
}

#[tokio::test]
async fn setters_persist_and_clear_env_values() {
    let data = tempfile::tempdir().unwrap();
    let env_file = data.path().join(".env");
    let store = EnvFileLocationStore::new(&env_file);
    let channel = Harness {
        store: Some(Arc::new(store.clone())),
        ..Harness::default()
    }
    .channel(RuntimeLocation::empty());

    let set = channel
        .call("set-runtime-path", Some(json!({"path": "  /opt/py/bin/python3 "})))
        .await;
    assert_eq!(set.data.unwrap()["runtimePath"], "/opt/py/bin/python3");
    channel
        .call("set-backend-root", Some(json!({"path": "/srv/backend"})))
        .await;

    let contents = std::fs::read_to_string(&env_file).unwrap();
    assert!(contents.contains("GODCODE_RUNTIME_PATH=/opt/py/bin/python3\n"));
    assert!(contents.contains("GODCODE_BACKEND_ROOT=/srv/backend\n"));

    channel
        .call("set-runtime-path", Some(json!({"path": ""})))
        .await;

    let stored = store.load().unwrap();
    assert_eq!(stored.runtime_path, None);
    assert_eq!(stored.backend_root.as_deref(), Some("/srv/backend"));
    assert!(!std::fs::read_to_string(&env_file).unwrap().contains("GODCODE_RUNTIME_PATH"));
}

#[tokio::test]
async fn resolve_paths_prefers_the_persisted_backend_root() {
    let data = tempfile::tempdir().unwrap();
    let store = EnvFileLocationStore::new(data.path().join(".env"));
    let backend = FakeBackend::new("exit 0\n");
    store
        .save_backend_root(&backend.root().to_string_lossy())
        .unwrap();

    let channel = Harness {
        store: Some(Arc::new(store)),
        ..Harness::default()
    }
    .channel(RuntimeLocation::empty());

    let resolved = channel.call("resolve-paths", None).await;

    assert!(resolved.success);
    let location = resolved.data.unwrap();
    let expected_root = std::fs::canonicalize(backend.root()).unwrap();
    assert_eq!(location["backendRoot"], json!(expected_root));
    assert!(location["runtimePath"].is_null());
    assert_eq!(channel.gateway().location().backend_root, Some(expected_root));
}
