// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending write queue.
//!
//! Producers append mutations at any time, including while offline. The sync
//! engine drains the queue head in batches and reports each batch back as
//! synced (deleted) or failed (returned to pending for a later cycle).
//!
//! Every mutation is written through the backing [`QueueStore`] before the
//! call returns, so a crash after `enqueue` never loses the entry. Nothing in
//! here blocks on the network; callers can interleave producers with a
//! running sync cycle freely.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::ClockSource;
use crate::entry::{QueueEntry, SyncState};
use crate::error::{Error, Result};
use crate::id::generate_unique_id;
use crate::store::QueueStore;

/// Durable FIFO of locally produced mutations.
pub struct PendingQueue {
    inner: Mutex<QueueInner>,
    clock: Arc<dyn ClockSource>,
    /// Rejections after which an entry is quarantined. `None` retries forever.
    max_attempts: Option<u32>,
}

struct QueueInner {
    store: Box<dyn QueueStore>,
    /// Entries keyed by insertion sequence.
    entries: BTreeMap<u64, QueueEntry>,
    index: HashMap<String, u64>,
    next_seq: u64,
}

impl QueueInner {
    fn get(&self, id: &str) -> Option<&QueueEntry> {
        let seq = self.index.get(id)?;
        self.entries.get(seq)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut QueueEntry> {
        let seq = self.index.get(id)?;
        self.entries.get_mut(seq)
    }

    /// Applies `change` to copies of the matching entries, persists them,
    /// then commits the copies to memory.
    fn transition<F>(&mut self, ids: &[String], mut change: F) -> Result<Vec<QueueEntry>>
    where
        F: FnMut(&QueueEntry) -> Option<QueueEntry>,
    {
        let mut seen = std::collections::HashSet::new();
        let updated: Vec<QueueEntry> = ids
            .iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| self.get(id))
            .filter_map(&mut change)
            .collect();
        if updated.is_empty() {
            return Ok(updated);
        }

        self.store.update(&updated)?;
        for entry in &updated {
            if let Some(stored) = self.get_mut(&entry.id) {
                stored.sync_state = entry.sync_state;
                stored.attempts = entry.attempts;
            }
        }
        Ok(updated)
    }

    fn delete(&mut self, ids: &[String]) -> Result<usize> {
        let present: Vec<String> = ids
            .iter()
            .filter(|id| self.index.contains_key(id.as_str()))
            .cloned()
            .collect();
        if present.is_empty() {
            return Ok(0);
        }

        self.store.remove(&present)?;
        let mut removed = 0;
        for id in &present {
            if let Some(seq) = self.index.remove(id) {
                self.entries.remove(&seq);
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl PendingQueue {
    /// Opens the queue on top of a backing store.
    ///
    /// Entries left in flight by a previous process never got a verdict from
    /// the remote side, so they go back to pending.
    pub fn open(mut store: Box<dyn QueueStore>, clock: Arc<dyn ClockSource>) -> Result<Self> {
        let loaded = store.load()?;

        let mut stale = Vec::new();
        let mut synced = Vec::new();
        let mut entries = BTreeMap::new();
        let mut index = HashMap::new();
        for (seq, mut entry) in (0u64..).zip(loaded) {
            match entry.sync_state {
                SyncState::Synced => {
                    synced.push(entry.id);
                    continue;
                }
                SyncState::InFlight => {
                    entry.sync_state = SyncState::Pending;
                    stale.push(entry.clone());
                }
                SyncState::Pending | SyncState::Failed => {}
            }
            if index.insert(entry.id.clone(), seq).is_some() {
                return Err(Error::CorruptedData(format!(
                    "queue entry '{}' stored twice",
                    entry.id
                )));
            }
            entries.insert(seq, entry);
        }

        if !stale.is_empty() {
            tracing::info!("returning {} in-flight entries to pending", stale.len());
            store.update(&stale)?;
        }
        if !synced.is_empty() {
            store.remove(&synced)?;
        }

        let next_seq = entries.keys().next_back().map_or(0, |seq| seq + 1);
        Ok(PendingQueue {
            inner: Mutex::new(QueueInner {
                store,
                entries,
                index,
                next_seq,
            }),
            clock,
            max_attempts: None,
        })
    }

    /// Quarantines entries once they have been rejected `max_attempts` times.
    ///
    /// `None` or `Some(0)` disables quarantine.
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts.filter(|&n| n > 0);
        self
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Appends a new pending entry and returns its generated id.
    pub fn enqueue(&self, module: &str, payload: serde_json::Value) -> Result<String> {
        validate_module(module)?;
        let now = self.clock.now_ms();
        let mut inner = self.lock();
        let seq = inner.next_seq;
        let id = generate_unique_id(module, now, seq, &payload, |candidate| {
            inner.index.contains_key(candidate)
        });
        Self::insert(&mut inner, id, module, payload, now)
    }

    /// Appends a new pending entry under a caller-assigned id.
    pub fn enqueue_with_id(
        &self,
        id: &str,
        module: &str,
        payload: serde_json::Value,
    ) -> Result<String> {
        validate_module(module)?;
        if id.trim().is_empty() {
            return Err(Error::InvalidInput("queue entry id cannot be empty".into()));
        }
        let now = self.clock.now_ms();
        let mut inner = self.lock();
        if inner.index.contains_key(id) {
            return Err(Error::DuplicateId(id.to_string()));
        }
        Self::insert(&mut inner, id.to_string(), module, payload, now)
    }

    fn insert(
        inner: &mut QueueInner,
        id: String,
        module: &str,
        payload: serde_json::Value,
        now_ms: u64,
    ) -> Result<String> {
        let entry = QueueEntry::new(
            id.clone(),
            module.to_string(),
            payload,
            crate::clock::to_datetime(now_ms),
        );
        inner.store.append(&entry)?;

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.index.insert(id.clone(), seq);
        inner.entries.insert(seq, entry);
        tracing::debug!("enqueued {} for module {}", id, module);
        Ok(id)
    }

    /// Returns pending entries in FIFO order, optionally capped.
    pub fn pending_entries(&self, limit: Option<usize>) -> Vec<QueueEntry> {
        let inner = self.lock();
        inner
            .entries
            .values()
            .filter(|e| e.sync_state == SyncState::Pending)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Moves pending entries to in-flight. Other states are left alone.
    pub fn mark_in_flight(&self, ids: &[String]) -> Result<()> {
        self.lock().transition(ids, |entry| {
            (entry.sync_state == SyncState::Pending).then(|| QueueEntry {
                sync_state: SyncState::InFlight,
                ..entry.clone()
            })
        })?;
        Ok(())
    }

    /// Records remote acceptance by deleting the entries.
    ///
    /// Ids that are already gone are ignored, so repeating the call is a no-op.
    pub fn mark_synced(&self, ids: &[String]) -> Result<()> {
        let removed = self.lock().delete(ids)?;
        tracing::debug!("{} entries synced", removed);
        Ok(())
    }

    /// Records a rejected transmission of in-flight entries.
    ///
    /// Each entry's attempt count goes up by one and it returns to pending,
    /// keeping its place in line. Entries reaching the attempt limit move to
    /// failed instead. Returns the ids quarantined by this call.
    pub fn mark_failed(&self, ids: &[String]) -> Result<Vec<String>> {
        let max_attempts = self.max_attempts;
        let updated = self.lock().transition(ids, |entry| {
            if entry.sync_state != SyncState::InFlight {
                return None;
            }
            let attempts = entry.attempts.saturating_add(1);
            let sync_state = match max_attempts {
                Some(max) if attempts >= max => SyncState::Failed,
                _ => SyncState::Pending,
            };
            Some(QueueEntry {
                sync_state,
                attempts,
                ..entry.clone()
            })
        })?;

        let quarantined: Vec<String> = updated
            .into_iter()
            .filter(|e| e.sync_state == SyncState::Failed)
            .map(|e| e.id)
            .collect();
        for id in &quarantined {
            tracing::warn!("quarantined {} after repeated rejection", id);
        }
        Ok(quarantined)
    }

    /// Returns in-flight entries to pending without counting an attempt.
    ///
    /// For transmissions abandoned before the remote side answered.
    pub fn release(&self, ids: &[String]) -> Result<usize> {
        let updated = self.lock().transition(ids, |entry| {
            (entry.sync_state == SyncState::InFlight).then(|| QueueEntry {
                sync_state: SyncState::Pending,
                ..entry.clone()
            })
        })?;
        Ok(updated.len())
    }

    /// Returns quarantined entries to pending with a fresh attempt count.
    pub fn requeue(&self, ids: &[String]) -> Result<usize> {
        let updated = self.lock().transition(ids, |entry| {
            (entry.sync_state == SyncState::Failed).then(|| QueueEntry {
                sync_state: SyncState::Pending,
                attempts: 0,
                ..entry.clone()
            })
        })?;
        Ok(updated.len())
    }

    /// Deletes quarantined entries without sending them.
    pub fn discard(&self, ids: &[String]) -> Result<usize> {
        let mut inner = self.lock();
        let failed: Vec<String> = ids
            .iter()
            .filter(|id| {
                inner
                    .get(id)
                    .is_some_and(|e| e.sync_state == SyncState::Failed)
            })
            .cloned()
            .collect();
        inner.delete(&failed)
    }

    /// Returns quarantined entries in FIFO order.
    pub fn quarantined(&self) -> Vec<QueueEntry> {
        let inner = self.lock();
        inner
            .entries
            .values()
            .filter(|e| e.sync_state == SyncState::Failed)
            .cloned()
            .collect()
    }

    /// Looks up an entry by id.
    pub fn get(&self, id: &str) -> Option<QueueEntry> {
        self.lock().get(id).cloned()
    }

    /// Number of stored entries in any state.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries waiting for a sync cycle.
    pub fn pending_count(&self) -> usize {
        self.lock()
            .entries
            .values()
            .filter(|e| e.sync_state == SyncState::Pending)
            .count()
    }
}

fn validate_module(module: &str) -> Result<()> {
    if module.trim().is_empty() {
        return Err(Error::InvalidInput("module cannot be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
