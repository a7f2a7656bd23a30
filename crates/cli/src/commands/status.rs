// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::init::backend_name;
use super::{open_store, runtime, Store};
use crate::error::Result;
use crate::sync::Connectivity;

pub fn run() -> Result<()> {
    let store = open_store()?;
    let connectivity = runtime()?.block_on(store.monitor().check_connection());
    run_impl(&store, connectivity, &mut std::io::stdout())
}

/// Internal implementation that takes the probed connectivity for testing.
pub(crate) fn run_impl(
    store: &Store,
    connectivity: Connectivity,
    out: &mut impl Write,
) -> Result<()> {
    let queue = store.queue()?;
    let cache = store.cache()?;
    let stats = cache.stats();
    let quota = cache.quota();

    writeln!(out, "Store: {}", store.work_dir.display())?;
    writeln!(
        out,
        "Queue backend: {}",
        backend_name(store.config.storage.backend)
    )?;
    match store.config.remote_url() {
        Some(url) => writeln!(out, "Remote: {} ({})", url, connectivity)?,
        None => writeln!(out, "Remote: none (local-only)")?,
    }
    writeln!(out, "Pending: {}", queue.pending_count())?;
    writeln!(out, "Quarantined: {}", queue.quarantined().len())?;
    writeln!(
        out,
        "Cache: {}/{} entries, {}/{} bytes",
        stats.count, quota.max_count, stats.total_size_bytes, quota.max_bytes
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
