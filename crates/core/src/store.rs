// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Backing store traits for the queue and the cache.
//!
//! The queue and cache keep their working set in memory and write every
//! mutation through one of these traits before returning. Implementations:
//!
//! - [`MemoryStore`]: nothing survives the process
//! - [`JournalStore`](crate::journal::JournalStore): JSONL journal (queue only)
//! - [`Database`](crate::db::Database): SQLite (queue and cache)

use std::collections::HashMap;

use crate::entry::{CacheEntry, QueueEntry};
use crate::error::Result;

/// Durable home of the pending queue.
///
/// Every method must be durable before it returns.
pub trait QueueStore: Send {
    /// Returns all stored entries in insertion order.
    fn load(&mut self) -> Result<Vec<QueueEntry>>;

    /// Stores a new entry after all existing ones.
    fn append(&mut self, entry: &QueueEntry) -> Result<()>;

    /// Persists the state and attempt count of existing entries.
    fn update(&mut self, entries: &[QueueEntry]) -> Result<()>;

    /// Deletes entries. Unknown ids are ignored.
    fn remove(&mut self, ids: &[String]) -> Result<()>;
}

/// Durable home of the local cache.
pub trait CacheStore: Send {
    /// Returns all stored entries, expired ones included.
    fn load(&mut self) -> Result<Vec<CacheEntry>>;

    /// Inserts or replaces an entry.
    fn put(&mut self, entry: &CacheEntry) -> Result<()> {
        self.replace(&[], entry)
    }

    /// Deletes `evict` and inserts or replaces `entry` as one write. On
    /// error the store is left as it was.
    fn replace(&mut self, evict: &[String], entry: &CacheEntry) -> Result<()>;

    /// Deletes entries. Unknown keys are ignored.
    fn remove(&mut self, keys: &[String]) -> Result<()>;
}

/// Volatile store for tests and ephemeral embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    queue: Vec<QueueEntry>,
    cache: HashMap<String, CacheEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueStore for MemoryStore {
    fn load(&mut self) -> Result<Vec<QueueEntry>> {
        Ok(self.queue.clone())
    }

    fn append(&mut self, entry: &QueueEntry) -> Result<()> {
        self.queue.push(entry.clone());
        Ok(())
    }

    fn update(&mut self, entries: &[QueueEntry]) -> Result<()> {
        for updated in entries {
            if let Some(stored) = self.queue.iter_mut().find(|e| e.id == updated.id) {
                stored.sync_state = updated.sync_state;
                stored.attempts = updated.attempts;
            }
        }
        Ok(())
    }

    fn remove(&mut self, ids: &[String]) -> Result<()> {
        self.queue.retain(|e| !ids.contains(&e.id));
        Ok(())
    }
}

impl CacheStore for MemoryStore {
    fn load(&mut self) -> Result<Vec<CacheEntry>> {
        Ok(self.cache.values().cloned().collect())
    }

    fn replace(&mut self, evict: &[String], entry: &CacheEntry) -> Result<()> {
        for key in evict {
            self.cache.remove(key);
        }
        self.cache.insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    fn remove(&mut self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.cache.remove(key);
        }
        Ok(())
    }
}
