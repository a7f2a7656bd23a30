// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;

#[test]
fn local_only_sync_reports_no_connection() {
    let temp = init_temp();
    enqueue(&temp, "orders", "{}");

    tether()
        .arg("sync")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Synced 0 record(s), 0 failed."))
        .stderr(predicate::str::contains("sync failed: No connection"));

    tether()
        .arg("status")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending: 1"));
}

#[test]
fn unreachable_remote_keeps_records() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);
    let temp = init_temp_with(&["--remote", &url]);
    enqueue(&temp, "orders", "{}");

    tether()
        .arg("sync")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No connection"));

    tether()
        .arg("status")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("(offline)"))
        .stdout(predicate::str::contains("Pending: 1"));
}

#[test]
fn empty_queue_syncs_trivially_when_reachable() {
    // Any listener that accepts TCP counts as reachable; no batch is sent
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let temp = init_temp_with(&["--remote", &url]);

    tether()
        .arg("sync")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout("Synced 0 record(s), 0 failed.\n");

    drop(listener);
}
