// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Batched synchronization of the pending queue.
//!
//! A cycle checks connectivity, snapshots the pending entries, and sends
//! them to the remote sink in consecutive batches, one at a time. Accepted
//! batches are deleted from the queue; rejected ones go back to pending for
//! the next cycle. A cycle dropped mid-send (a stopped timer, a caller's
//! timeout) returns its in-flight batch to pending. At most one cycle runs
//! at a time.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use tether_core::{ClockSource, PendingQueue, SyncBatch};

use super::connectivity::ConnectivityMonitor;
use super::sink::RemoteSink;
use crate::config::SyncConfig;

/// Error reported when a cycle is requested while another one runs.
pub const SYNC_IN_PROGRESS: &str = "Sync already in progress";

/// Error reported when the monitor says the link is down.
pub const NO_CONNECTION: &str = "No connection";

/// Tuning for synchronization cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum entries per batch.
    pub batch_size: usize,
    /// Time allowed for one batch before it counts as rejected.
    pub send_timeout: Duration,
    /// Period of the auto-sync timer.
    pub auto_sync_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for EngineConfig {
    fn from(config: &SyncConfig) -> Self {
        EngineConfig {
            batch_size: config.batch_size,
            send_timeout: Duration::from_millis(config.send_timeout_ms),
            auto_sync_interval: Duration::from_millis(config.auto_sync_interval_ms),
        }
    }
}

/// Outcome of one `synchronize()` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// True iff no batch failed.
    pub success: bool,
    pub records_sent: usize,
    pub records_failed: usize,
    /// Entries moved to quarantine during this cycle.
    pub records_quarantined: usize,
    pub errors: Vec<String>,
}

impl SyncResult {
    fn failed(error: &str) -> Self {
        SyncResult {
            errors: vec![error.to_string()],
            ..Default::default()
        }
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "ok" } else { "failed" };
        write!(
            f,
            "{}: {} sent, {} failed",
            status, self.records_sent, self.records_failed
        )?;
        if self.records_quarantined > 0 {
            write!(f, ", {} quarantined", self.records_quarantined)?;
        }
        if !self.errors.is_empty() {
            write!(f, " ({})", self.errors.join("; "))?;
        }
        Ok(())
    }
}

/// Whether a cycle is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Syncing,
}

/// Resets the syncing flag on every exit path.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Returns a batch to pending if its send is dropped before a verdict.
struct InFlight<'a> {
    queue: &'a PendingQueue,
    ids: &'a [String],
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn mark(queue: &'a PendingQueue, ids: &'a [String]) -> tether_core::Result<Self> {
        queue.mark_in_flight(ids)?;
        Ok(InFlight {
            queue,
            ids,
            settled: false,
        })
    }

    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        match self.queue.release(self.ids) {
            Ok(n) => tracing::info!("sync interrupted, {} entries back to pending", n),
            Err(e) => tracing::error!("could not return interrupted batch to pending: {}", e),
        }
    }
}

enum BatchOutcome {
    Accepted,
    Rejected { reason: String, quarantined: usize },
}

/// Drains the pending queue into a remote sink.
pub struct SyncEngine<M: ConnectivityMonitor, S: RemoteSink> {
    queue: Arc<PendingQueue>,
    monitor: M,
    sink: S,
    clock: Arc<dyn ClockSource>,
    config: EngineConfig,
    syncing: AtomicBool,
    last_sync: Mutex<Option<DateTime<Utc>>>,
    auto_sync: Mutex<Option<JoinHandle<()>>>,
}

impl<M: ConnectivityMonitor, S: RemoteSink> SyncEngine<M, S> {
    pub fn new(
        queue: Arc<PendingQueue>,
        monitor: M,
        sink: S,
        clock: Arc<dyn ClockSource>,
        config: EngineConfig,
    ) -> Self {
        SyncEngine {
            queue,
            monitor,
            sink,
            clock,
            config,
            syncing: AtomicBool::new(false),
            last_sync: Mutex::new(None),
            auto_sync: Mutex::new(None),
        }
    }

    pub fn queue(&self) -> &Arc<PendingQueue> {
        &self.queue
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> SyncPhase {
        if self.is_sync_in_progress() {
            SyncPhase::Syncing
        } else {
            SyncPhase::Idle
        }
    }

    pub fn is_sync_in_progress(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// When the last completed cycle finished, if any.
    pub fn last_sync_timestamp(&self) -> Option<DateTime<Utc>> {
        *lock(&self.last_sync)
    }

    pub fn pending_count(&self) -> usize {
        self.queue.pending_count()
    }

    /// Runs one synchronization cycle.
    ///
    /// Never fails: every problem is reported in the returned
    /// [`SyncResult`]. A call made while another cycle runs returns at once
    /// with [`SYNC_IN_PROGRESS`].
    pub async fn synchronize(&self) -> SyncResult {
        // Claimed before the first await so two callers cannot both pass
        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("sync requested while a cycle is running");
            return SyncResult::failed(SYNC_IN_PROGRESS);
        }
        let _guard = CycleGuard(&self.syncing);

        let connectivity = self.monitor.check_connection().await;
        if !connectivity.is_online() {
            tracing::info!("skipping sync: offline");
            return SyncResult::failed(NO_CONNECTION);
        }

        let pending = self.queue.pending_entries(None);
        if pending.is_empty() {
            self.record_sync();
            return SyncResult {
                success: true,
                ..Default::default()
            };
        }

        let batches = SyncBatch::partition(pending, self.config.batch_size);
        tracing::info!(
            "sync starting: {} entries in {} batches ({})",
            batches.iter().map(SyncBatch::len).sum::<usize>(),
            batches.len(),
            connectivity
        );

        let mut result = SyncResult::default();
        for (pos, batch) in batches.iter().enumerate() {
            let label = format!("batch {} of {}", batch.index + 1, batches.len());
            match self.process_batch(batch).await {
                Ok(BatchOutcome::Accepted) => {
                    result.records_sent += batch.len();
                }
                Ok(BatchOutcome::Rejected {
                    reason,
                    quarantined,
                }) => {
                    tracing::warn!("{} ({} entries) failed: {}", label, batch.len(), reason);
                    result.records_failed += batch.len();
                    result.records_quarantined += quarantined;
                    result.errors.push(format!("{label} failed: {reason}"));
                }
                Err(e) => {
                    // Local storage failed; nothing from here on was confirmed
                    let unconfirmed: usize = batches[pos..].iter().map(SyncBatch::len).sum();
                    tracing::warn!("{} aborted the cycle: {}", label, e);
                    result.records_failed += unconfirmed;
                    result.errors.push(format!("{label}: storage error: {e}"));
                    break;
                }
            }
        }

        result.success = result.records_failed == 0;
        self.record_sync();
        tracing::info!("sync finished: {}", result);
        result
    }

    async fn process_batch(&self, batch: &SyncBatch) -> tether_core::Result<BatchOutcome> {
        let ids = batch.ids();
        let in_flight = InFlight::mark(&self.queue, &ids)?;

        let verdict =
            match tokio::time::timeout(self.config.send_timeout, self.sink.send_batch(batch)).await
            {
                Ok(Ok(true)) => Ok(()),
                Ok(Ok(false)) => Err("rejected by remote".to_string()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("timed out after {:?}", self.config.send_timeout)),
            };
        // No await past this point, so the verdict below is always recorded
        in_flight.settle();

        match verdict {
            Ok(()) => {
                if let Err(e) = self.queue.mark_synced(&ids) {
                    // Leave nothing stuck in flight
                    if let Err(revert) = self.queue.mark_failed(&ids) {
                        tracing::error!("could not return batch to pending: {}", revert);
                    }
                    return Err(e);
                }
                Ok(BatchOutcome::Accepted)
            }
            Err(reason) => {
                let quarantined = self.queue.mark_failed(&ids)?;
                Ok(BatchOutcome::Rejected {
                    reason,
                    quarantined: quarantined.len(),
                })
            }
        }
    }

    fn record_sync(&self) {
        *lock(&self.last_sync) = Some(self.clock.now());
    }

    /// Whether an auto-sync timer is active.
    pub fn is_auto_sync_running(&self) -> bool {
        lock(&self.auto_sync)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Stops the auto-sync timer, if running.
    pub fn stop_auto_sync(&self) {
        if let Some(task) = lock(&self.auto_sync).take() {
            task.abort();
            tracing::debug!("auto-sync stopped");
        }
    }
}

impl<M, S> SyncEngine<M, S>
where
    M: ConnectivityMonitor + 'static,
    S: RemoteSink + 'static,
{
    /// Starts periodic synchronization, running one cycle immediately.
    ///
    /// Restarting replaces the previous timer. The timer holds only a weak
    /// reference, so dropping the engine ends it.
    pub fn start_auto_sync(self: &Arc<Self>) {
        self.start_auto_sync_with(|_| {});
    }

    /// Like [`start_auto_sync`](Self::start_auto_sync), reporting each
    /// cycle's result to `on_result`.
    pub fn start_auto_sync_with<F>(self: &Arc<Self>, on_result: F)
    where
        F: Fn(&SyncResult) + Send + 'static,
    {
        let mut slot = lock(&self.auto_sync);
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let engine = Arc::downgrade(self);
        let period = self.config.auto_sync_interval;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                let result = engine.synchronize().await;
                drop(engine);
                on_result(&result);
            }
        }));
        tracing::debug!("auto-sync started every {:?}", period);
    }
}

impl<M: ConnectivityMonitor, S: RemoteSink> Drop for SyncEngine<M, S> {
    fn drop(&mut self) {
        self.stop_auto_sync();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
