// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use tempfile::TempDir;
use yare::parameterized;

#[test]
fn empty_document_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.sync.batch_size, 50);
    assert_eq!(config.sync.auto_sync_interval_ms, 30_000);
    assert_eq!(config.cache.quota_bytes, 5_242_880);
    assert_eq!(config.cache.quota_count, 1000);
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert!(config.remote.is_none());
    assert_eq!(config.max_attempts(), None);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = Config::parse(
        r#"
[sync]
batch_size = 5
max_attempts = 3

[storage]
backend = "journal"

[remote]
url = "wss://sync.example.com/batches"
"#,
    )
    .unwrap();

    assert_eq!(config.sync.batch_size, 5);
    assert_eq!(config.sync.send_timeout_ms, 10_000);
    assert_eq!(config.max_attempts(), Some(3));
    assert_eq!(config.storage.backend, StorageBackend::Journal);
    let remote = config.remote.unwrap();
    assert_eq!(remote.probe_timeout_ms, 2_000);
    assert_eq!(remote.degraded_latency_ms, 500);
}

#[parameterized(
    zero_batch = { "[sync]\nbatch_size = 0", "batch_size" },
    zero_interval = { "[sync]\nauto_sync_interval_ms = 0", "auto_sync_interval_ms" },
    zero_timeout = { "[sync]\nsend_timeout_ms = 0", "send_timeout_ms" },
    http_url = { "[remote]\nurl = \"http://example.com\"", "ws://" },
    missing_host = { "[remote]\nurl = \"ws://\"", "missing host" },
    zero_probe = { "[remote]\nurl = \"ws://a\"\nprobe_timeout_ms = 0", "probe_timeout_ms" },
)]
fn invalid_values_are_rejected(doc: &str, needle: &str) {
    let err = Config::parse(doc).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains(needle), "{err}");
}

#[parameterized(
    unknown_backend = { "[storage]\nbackend = \"redis\"" },
    wrong_type = { "[sync]\nbatch_size = \"many\"" },
    remote_without_url = { "[remote]\nprobe_timeout_ms = 5" },
)]
fn malformed_documents_fail_to_parse(doc: &str) {
    assert!(matches!(Config::parse(doc).unwrap_err(), Error::Toml(_)));
}

#[test]
fn cache_config_converts_to_quota_and_ttl() {
    let cache = CacheConfig {
        quota_bytes: 10,
        quota_count: 2,
        default_ttl_ms: 1_500,
    };
    assert_eq!(
        cache.quota(),
        CacheQuota {
            max_bytes: 10,
            max_count: 2
        }
    );
    assert_eq!(cache.default_ttl(), Duration::from_millis(1_500));
}

#[test]
fn init_and_load_config() {
    let temp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.remote = Some(RemoteConfig::new("ws://localhost:7890"));

    let work_dir = init_work_dir(temp.path(), &config).unwrap();

    assert!(work_dir.ends_with(".tether"));
    assert_eq!(Config::load(&work_dir).unwrap(), config);
}

#[test]
fn already_initialized() {
    let temp = TempDir::new().unwrap();
    init_work_dir(temp.path(), &Config::default()).unwrap();

    let err = init_work_dir(temp.path(), &Config::default()).unwrap_err();
    assert!(err.to_string().contains("already initialized"));
}

#[test]
fn init_rejects_invalid_config_without_creating_dir() {
    let temp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.sync.batch_size = 0;

    assert!(init_work_dir(temp.path(), &config).is_err());
    assert!(!temp.path().join(".tether").exists());
}

#[test]
fn load_missing_config_fails() {
    let temp = TempDir::new().unwrap();
    let err = Config::load(temp.path()).unwrap_err();
    assert!(err.to_string().contains("failed to read config"));
}

#[parameterized(
    sqlite = { StorageBackend::Sqlite, "tether.db" },
    journal = { StorageBackend::Journal, "queue.jsonl" },
)]
fn queue_path_follows_backend(backend: StorageBackend, file: &str) {
    let work_dir = PathBuf::from("/project/.tether");
    let mut config = Config::default();
    config.storage.backend = backend;
    assert_eq!(get_queue_path(&work_dir, &config), work_dir.join(file));
}
