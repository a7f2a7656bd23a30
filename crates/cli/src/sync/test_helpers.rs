// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tether_core::{
    ClockSource, ManualClock, MemoryStore, PendingQueue, QueueEntry, QueueStore, SyncBatch,
};
use tokio::sync::Notify;

use super::connectivity::{Connectivity, ConnectivityMonitor};
use super::sink::{RemoteSink, SinkError, SinkResult};

/// Create a pending entry with the given id.
pub fn make_entry(id: &str) -> QueueEntry {
    QueueEntry::new(
        id.to_string(),
        "test".to_string(),
        json!({ "id": id }),
        tether_core::clock::to_datetime(1_700_000_000_000),
    )
}

/// Create a batch of `len` entries with ids `e-0`, `e-1`, ...
pub fn make_batch(index: usize, len: usize) -> SyncBatch {
    SyncBatch {
        index,
        entries: (0..len).map(|i| make_entry(&format!("e-{i}"))).collect(),
    }
}

pub fn test_clock() -> Arc<dyn ClockSource> {
    Arc::new(ManualClock::new(1_700_000_000_000))
}

/// In-memory queue holding `n` entries.
pub fn make_queue(n: usize) -> Arc<PendingQueue> {
    let queue = PendingQueue::open(Box::new(MemoryStore::new()), test_clock()).unwrap();
    for i in 0..n {
        queue.enqueue("orders", json!({ "n": i })).unwrap();
    }
    Arc::new(queue)
}

/// Monitor whose answer tests can change.
#[derive(Clone)]
pub struct MockMonitor {
    state: Arc<Mutex<Connectivity>>,
    calls: Arc<AtomicUsize>,
}

impl MockMonitor {
    pub fn new(state: Connectivity) -> Self {
        MockMonitor {
            state: Arc::new(Mutex::new(state)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set(&self, state: Connectivity) {
        *self.state.lock().unwrap() = state;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ConnectivityMonitor for MockMonitor {
    fn check_connection(&self) -> Pin<Box<dyn Future<Output = Connectivity> + Send + '_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = *self.state.lock().unwrap();
        Box::pin(async move { state })
    }
}

/// How the mock sink answers one batch.
#[derive(Clone)]
pub enum Behavior {
    Accept,
    Reject,
    Fail(String),
    /// Never answers.
    Hang,
    /// Accepts once the notify fires.
    WaitFor(Arc<Notify>),
}

/// Sink that follows a script, then falls back to a default behavior.
#[derive(Clone)]
pub struct MockSink {
    script: Arc<Mutex<VecDeque<Behavior>>>,
    fallback: Arc<Mutex<Behavior>>,
    /// Ids of every batch received, in order.
    sent: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockSink {
    pub fn accepting() -> Self {
        Self::with_fallback(Behavior::Accept)
    }

    pub fn with_fallback(fallback: Behavior) -> Self {
        MockSink {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(fallback)),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue behaviors for the next batches.
    pub fn script(&self, behaviors: impl IntoIterator<Item = Behavior>) {
        self.script.lock().unwrap().extend(behaviors);
    }

    pub fn set_fallback(&self, behavior: Behavior) {
        *self.fallback.lock().unwrap() = behavior;
    }

    pub fn sent(&self) -> Vec<Vec<String>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl RemoteSink for MockSink {
    fn send_batch<'a>(
        &'a self,
        batch: &'a SyncBatch,
    ) -> Pin<Box<dyn Future<Output = SinkResult<bool>> + Send + 'a>> {
        self.sent.lock().unwrap().push(batch.ids());
        let behavior = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.lock().unwrap().clone());
        Box::pin(async move {
            match behavior {
                Behavior::Accept => Ok(true),
                Behavior::Reject => Ok(false),
                Behavior::Fail(message) => Err(SinkError::SendFailed(message)),
                Behavior::Hang => std::future::pending().await,
                Behavior::WaitFor(gate) => {
                    gate.notified().await;
                    Ok(true)
                }
            }
        })
    }
}

/// Queue store whose writes can be switched off.
pub struct SwitchableStore {
    inner: MemoryStore,
    failing: Arc<AtomicBool>,
}

impl SwitchableStore {
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let failing = Arc::new(AtomicBool::new(false));
        let store = SwitchableStore {
            inner: MemoryStore::new(),
            failing: Arc::clone(&failing),
        };
        (store, failing)
    }

    fn check(&self) -> tether_core::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(tether_core::Error::Io(std::io::Error::other("disk full")))
        } else {
            Ok(())
        }
    }
}

impl QueueStore for SwitchableStore {
    fn load(&mut self) -> tether_core::Result<Vec<QueueEntry>> {
        QueueStore::load(&mut self.inner)
    }

    fn append(&mut self, entry: &QueueEntry) -> tether_core::Result<()> {
        self.check()?;
        self.inner.append(entry)
    }

    fn update(&mut self, entries: &[QueueEntry]) -> tether_core::Result<()> {
        self.check()?;
        self.inner.update(entries)
    }

    fn remove(&mut self, ids: &[String]) -> tether_core::Result<()> {
        self.check()?;
        QueueStore::remove(&mut self.inner, ids)
    }
}
