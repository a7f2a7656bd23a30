// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub fn tether() -> Command {
    cargo_bin_cmd!("tether")
}

/// Helper to create an initialized local-only store
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    tether()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to initialize a store with extra `init` arguments
pub fn init_temp_with(args: &[&str]) -> TempDir {
    let temp = TempDir::new().unwrap();
    tether()
        .arg("init")
        .args(args)
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to enqueue a record and return its id
pub fn enqueue(temp: &TempDir, module: &str, payload: &str) -> String {
    let output = tether()
        .args(["enqueue", module, payload])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
