// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local key/value cache with per-entry expiry and a size/count quota.
//!
//! Expired entries are removed lazily: a read that finds one deletes it.
//! Writes that would break the quota evict expired entries first, then the
//! least recently used ones, until the new entry fits.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::ClockSource;
use crate::entry::CacheEntry;
use crate::error::{Error, Result};
use crate::store::CacheStore;

/// Limits enforced on the cache as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheQuota {
    /// Upper bound on the summed size of all entries.
    pub max_bytes: u64,
    /// Upper bound on the number of entries.
    pub max_count: usize,
}

impl Default for CacheQuota {
    fn default() -> Self {
        CacheQuota {
            max_bytes: 5 * 1024 * 1024,
            max_count: 1000,
        }
    }
}

/// Snapshot of the live (non-expired) cache contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub count: usize,
    pub total_size_bytes: u64,
}

struct Slot {
    entry: CacheEntry,
    /// Key into the recency map.
    tick: u64,
}

struct CacheInner {
    store: Box<dyn CacheStore>,
    entries: HashMap<String, Slot>,
    /// Least recently used first.
    recency: BTreeMap<u64, String>,
    next_tick: u64,
    /// Size of every stored entry, expired ones included.
    total_bytes: u64,
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        if let Some(slot) = self.entries.get_mut(key) {
            self.recency.remove(&slot.tick);
            slot.tick = tick;
            self.recency.insert(tick, key.to_string());
            self.next_tick += 1;
        }
    }

    fn insert(&mut self, entry: CacheEntry) {
        self.forget(&entry.key);
        let tick = self.next_tick;
        self.next_tick += 1;
        self.total_bytes += entry.size_bytes;
        self.recency.insert(tick, entry.key.clone());
        self.entries.insert(entry.key.clone(), Slot { entry, tick });
    }

    /// Drops an entry from memory only.
    fn forget(&mut self, key: &str) -> Option<CacheEntry> {
        let slot = self.entries.remove(key)?;
        self.recency.remove(&slot.tick);
        self.total_bytes = self.total_bytes.saturating_sub(slot.entry.size_bytes);
        Some(slot.entry)
    }

    /// Deletes entries from the store, then from memory.
    fn remove(&mut self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        self.store.remove(keys)?;
        for key in keys {
            self.forget(key);
        }
        Ok(())
    }

    fn expired_keys(&self, now_ms: u64) -> Vec<String> {
        self.recency
            .values()
            .filter(|key| {
                self.entries
                    .get(key.as_str())
                    .is_some_and(|slot| slot.entry.is_expired(now_ms))
            })
            .cloned()
            .collect()
    }

    /// Picks the entries to drop so that `incoming` fits under `quota`.
    ///
    /// `incoming` replaces any entry stored under the same key, so that entry
    /// is neither counted nor chosen.
    fn plan_evictions(
        &self,
        quota: CacheQuota,
        now_ms: u64,
        incoming: Option<&CacheEntry>,
    ) -> Vec<String> {
        let replaced = incoming.and_then(|e| self.entries.get(&e.key));
        let mut bytes = self.total_bytes - replaced.map_or(0, |slot| slot.entry.size_bytes);
        let mut count = self.entries.len() - usize::from(replaced.is_some());
        let (add_bytes, add_count) = incoming.map_or((0, 0), |e| (e.size_bytes, 1));
        let fits = |bytes: u64, count: usize| {
            bytes + add_bytes <= quota.max_bytes && count + add_count <= quota.max_count
        };

        let skip = incoming.map(|e| e.key.as_str());
        let expired = self.expired_keys(now_ms);
        let by_recency = self.recency.values().filter(|key| !expired.contains(*key));

        let mut evict = Vec::new();
        for key in expired.iter().chain(by_recency) {
            if fits(bytes, count) {
                break;
            }
            if Some(key.as_str()) == skip {
                continue;
            }
            if let Some(slot) = self.entries.get(key.as_str()) {
                bytes -= slot.entry.size_bytes;
                count -= 1;
                evict.push(key.clone());
            }
        }
        evict
    }
}

/// Durable key/value cache for read-mostly data.
pub struct LocalCache {
    inner: Mutex<CacheInner>,
    clock: Arc<dyn ClockSource>,
    quota: CacheQuota,
    default_ttl: Duration,
}

impl LocalCache {
    /// Opens the cache on top of a backing store.
    ///
    /// Recency starts in creation order. If the stored entries exceed
    /// `quota` (for example after lowering it), the oldest are evicted.
    pub fn open(
        mut store: Box<dyn CacheStore>,
        clock: Arc<dyn ClockSource>,
        quota: CacheQuota,
        default_ttl: Duration,
    ) -> Result<Self> {
        let mut loaded = store.load()?;
        loaded.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut inner = CacheInner {
            store,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_tick: 0,
            total_bytes: 0,
        };
        for entry in loaded {
            inner.insert(entry);
        }

        let evict = inner.plan_evictions(quota, clock.now_ms(), None);
        if !evict.is_empty() {
            tracing::info!("evicting {} cache entries over quota", evict.len());
            inner.remove(&evict)?;
        }

        Ok(LocalCache {
            inner: Mutex::new(inner),
            clock,
            quota,
            default_ttl,
        })
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn quota(&self) -> CacheQuota {
        self.quota
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Inserts or overwrites `key`, expiring after `ttl` (or the default).
    ///
    /// Fails with [`Error::QuotaExceeded`] when the entry cannot fit even in
    /// an otherwise empty cache. Nothing is evicted when the call fails.
    pub fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let now = self.clock.now_ms();
        let entry = CacheEntry::new(
            key.to_string(),
            value,
            now,
            ttl.unwrap_or(self.default_ttl),
        );
        if entry.size_bytes > self.quota.max_bytes || self.quota.max_count == 0 {
            return Err(Error::QuotaExceeded {
                key: entry.key,
                size: entry.size_bytes,
                quota: self.quota.max_bytes,
            });
        }

        let mut inner = self.lock();
        let evict = inner.plan_evictions(self.quota, now, Some(&entry));
        if !evict.is_empty() {
            tracing::debug!("evicting {:?} to admit {}", evict, key);
        }

        // Evictions and the insert land together or not at all
        inner.store.replace(&evict, &entry)?;
        for evicted in &evict {
            inner.forget(evicted);
        }
        inner.insert(entry);
        Ok(())
    }

    /// Serializes `value` as JSON and stores it under `key`.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        self.set(key, serde_json::to_vec(value)?, ttl)
    }

    /// Returns the value for `key` unless it is absent or expired.
    ///
    /// An expired entry found here is deleted. A hit marks the entry as most
    /// recently used.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = self.clock.now_ms();
        let mut inner = self.lock();
        let Some(slot) = inner.entries.get(key) else {
            return Ok(None);
        };

        if slot.entry.is_expired(now) {
            tracing::debug!("cache entry {} expired", key);
            inner.remove(&[key.to_string()])?;
            return Ok(None);
        }

        let value = slot.entry.value.clone();
        inner.touch(key);
        Ok(Some(value))
    }

    /// Reads and deserializes a JSON value stored with [`set_json`](Self::set_json).
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Removes `key`. Returns whether an entry was stored under it.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let mut inner = self.lock();
        if !inner.entries.contains_key(key) {
            return Ok(false);
        }
        inner.remove(&[key.to_string()])?;
        Ok(true)
    }

    /// Whether a live entry exists. Does not affect recency.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.lock()
            .entries
            .get(key)
            .is_some_and(|slot| !slot.entry.is_expired(now))
    }

    /// Counts live entries and their total size.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let inner = self.lock();
        inner
            .entries
            .values()
            .filter(|slot| !slot.entry.is_expired(now))
            .fold(CacheStats::default(), |stats, slot| CacheStats {
                count: stats.count + 1,
                total_size_bytes: stats.total_size_bytes + slot.entry.size_bytes,
            })
    }

    /// Deletes every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now_ms();
        let mut inner = self.lock();
        let expired = inner.expired_keys(now);
        inner.remove(&expired)?;
        if !expired.is_empty() {
            tracing::debug!("purged {} expired cache entries", expired.len());
        }
        Ok(expired.len())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
