// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending queue commands: enqueue, list, and quarantine handling.

use std::io::Write;

use tether_core::{PendingQueue, QueueEntry};

use super::open_store;
use crate::cli::OutputFormat;
use crate::error::{Error, Result};

pub fn enqueue(module: &str, payload: &str, id: Option<&str>) -> Result<()> {
    let queue = open_store()?.queue()?;
    enqueue_impl(&queue, module, payload, id, &mut std::io::stdout())
}

pub(crate) fn enqueue_impl(
    queue: &PendingQueue,
    module: &str,
    payload: &str,
    id: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let payload: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| Error::InvalidPayload(e.to_string()))?;
    let id = match id {
        Some(id) => queue.enqueue_with_id(id, module, payload)?,
        None => queue.enqueue(module, payload)?,
    };
    writeln!(out, "{}", id)?;
    Ok(())
}

pub fn pending(limit: Option<usize>, output: OutputFormat) -> Result<()> {
    let queue = open_store()?.queue()?;
    pending_impl(&queue, limit, output, &mut std::io::stdout())
}

pub(crate) fn pending_impl(
    queue: &PendingQueue,
    limit: Option<usize>,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let entries = queue.pending_entries(limit);
    match output {
        OutputFormat::Json => print_json(&entries, out),
        OutputFormat::Text if entries.is_empty() => {
            writeln!(out, "No pending records.")?;
            Ok(())
        }
        OutputFormat::Text => print_entries(&entries, out),
    }
}

pub fn quarantine(requeue: &[String], discard: &[String]) -> Result<()> {
    let queue = open_store()?.queue()?;
    quarantine_impl(&queue, requeue, discard, &mut std::io::stdout())
}

/// Lists quarantined records, or requeues/discards the given ids.
///
/// Every id must name a quarantined record; nothing changes otherwise.
pub(crate) fn quarantine_impl(
    queue: &PendingQueue,
    requeue: &[String],
    discard: &[String],
    out: &mut impl Write,
) -> Result<()> {
    let quarantined = queue.quarantined();
    let ensure_quarantined = |ids: &[String]| -> Result<()> {
        match ids.iter().find(|id| !quarantined.iter().any(|e| &e.id == *id)) {
            Some(missing) => Err(Error::EntryNotFound(missing.clone())),
            None => Ok(()),
        }
    };

    if !requeue.is_empty() {
        ensure_quarantined(requeue)?;
        let n = queue.requeue(requeue)?;
        writeln!(out, "Requeued {} record(s).", n)?;
    } else if !discard.is_empty() {
        ensure_quarantined(discard)?;
        let n = queue.discard(discard)?;
        writeln!(out, "Discarded {} record(s).", n)?;
    } else if quarantined.is_empty() {
        writeln!(out, "No quarantined records.")?;
    } else {
        print_entries(&quarantined, out)?;
    }
    Ok(())
}

fn print_entries(entries: &[QueueEntry], out: &mut impl Write) -> Result<()> {
    for entry in entries {
        writeln!(
            out,
            "{}  {}  attempts={}  {}",
            entry.id, entry.module, entry.attempts, entry.payload
        )?;
    }
    Ok(())
}

fn print_json(entries: &[QueueEntry], out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, entries)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
