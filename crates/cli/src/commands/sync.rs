// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot and periodic synchronization.

use std::io::Write;
use std::sync::Arc;

use super::{open_store, runtime, Engine};
use crate::error::{Error, Result};

/// Run a single cycle and report it.
pub fn once() -> Result<()> {
    let store = open_store()?;
    let engine = store.engine(store.queue()?);
    runtime()?.block_on(once_impl(&engine, &mut std::io::stdout()))
}

pub(crate) async fn once_impl(engine: &Engine, out: &mut impl Write) -> Result<()> {
    let result = engine.synchronize().await;
    writeln!(
        out,
        "Synced {} record(s), {} failed.",
        result.records_sent, result.records_failed
    )?;
    if result.records_quarantined > 0 {
        writeln!(
            out,
            "Quarantined {} record(s); see 'tether quarantine'.",
            result.records_quarantined
        )?;
    }
    if result.success {
        Ok(())
    } else {
        Err(Error::Sync(result.errors.join("; ")))
    }
}

/// Sync on the configured interval until Ctrl-C.
pub fn watch() -> Result<()> {
    let store = open_store()?;
    let engine = Arc::new(store.engine(store.queue()?));
    println!(
        "Watching: syncing every {:?}. Press Ctrl-C to stop.",
        engine.config().auto_sync_interval
    );
    runtime()?.block_on(async {
        engine.start_auto_sync_with(|result| println!("{}", result));
        tokio::signal::ctrl_c().await?;
        engine.stop_auto_sync();
        Ok::<(), Error>(())
    })
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
