// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tether_core::SystemClock;

use super::Store;
use crate::config::{init_work_dir, Config, RemoteConfig, StorageBackend, StorageConfig};
use crate::error::Result;

pub fn run(path: Option<String>, remote: Option<String>, backend: StorageBackend) -> Result<()> {
    let target_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };
    run_impl(
        &target_path,
        remote.as_deref(),
        backend,
        &mut std::io::stdout(),
    )
}

/// Internal implementation that accepts an output sink for testing.
pub(crate) fn run_impl(
    target_path: &Path,
    remote: Option<&str>,
    backend: StorageBackend,
    out: &mut impl Write,
) -> Result<()> {
    let config = Config {
        storage: StorageConfig { backend },
        remote: remote.map(RemoteConfig::new),
        ..Config::default()
    };
    let work_dir = init_work_dir(target_path, &config)?;

    // Create the storage files now so later commands find them
    let store = Store::open(work_dir.clone(), Arc::new(SystemClock))?;
    store.queue()?;
    store.cache()?;

    writeln!(out, "Initialized tether store at {}", work_dir.display())?;
    writeln!(out, "Queue backend: {}", backend_name(backend))?;
    match remote {
        Some(url) => writeln!(out, "Remote: {}", url)?,
        None => writeln!(out, "Remote: none (local-only)")?,
    }
    Ok(())
}

pub(crate) fn backend_name(backend: StorageBackend) -> &'static str {
    match backend {
        StorageBackend::Sqlite => "sqlite",
        StorageBackend::Journal => "journal",
    }
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
