// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::TestContext;
use crate::config::get_db_path;
use crate::error::Error;
use tempfile::TempDir;

#[test]
fn init_local_store() {
    let temp = TempDir::new().unwrap();

    let out = TestContext::output(|out| {
        run_impl(temp.path(), None, StorageBackend::Sqlite, out)
    });

    let work_dir = temp.path().join(".tether");
    assert!(out.contains("Initialized tether store"));
    assert!(out.contains("Queue backend: sqlite"));
    assert!(out.contains("Remote: none (local-only)"));
    assert!(get_db_path(&work_dir).exists());
    let config = Config::load(&work_dir).unwrap();
    assert!(config.remote.is_none());
}

#[test]
fn init_with_remote_and_journal() {
    let temp = TempDir::new().unwrap();

    let out = TestContext::output(|out| {
        run_impl(
            temp.path(),
            Some("ws://localhost:7890"),
            StorageBackend::Journal,
            out,
        )
    });

    let work_dir = temp.path().join(".tether");
    assert!(out.contains("Remote: ws://localhost:7890"));
    assert!(work_dir.join("queue.jsonl").exists());
    let config = Config::load(&work_dir).unwrap();
    assert_eq!(config.remote_url(), Some("ws://localhost:7890"));
    assert_eq!(config.storage.backend, StorageBackend::Journal);
}

#[test]
fn init_twice_fails() {
    let temp = TempDir::new().unwrap();
    run_impl(temp.path(), None, StorageBackend::Sqlite, &mut Vec::new()).unwrap();

    let err = run_impl(temp.path(), None, StorageBackend::Sqlite, &mut Vec::new()).unwrap_err();

    assert!(matches!(err, Error::AlreadyInitialized(_)));
}

#[test]
fn invalid_remote_leaves_nothing_behind() {
    let temp = TempDir::new().unwrap();

    let err = run_impl(
        temp.path(),
        Some("http://localhost"),
        StorageBackend::Sqlite,
        &mut Vec::new(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(!temp.path().join(".tether").exists());
}
