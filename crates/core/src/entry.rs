// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Records held by the local data layer.
//!
//! - [`QueueEntry`]: a locally produced mutation waiting for the remote side
//! - [`CacheEntry`]: a read-mostly cached value with an expiry
//! - [`SyncBatch`]: a contiguous run of queue entries sent as one unit

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Synchronization state of a queue entry.
///
/// Valid transitions:
/// - Pending -> InFlight (a cycle picked it up)
/// - InFlight -> Synced (accepted; the entry is deleted)
/// - InFlight -> Pending (batch rejected; attempts incremented)
/// - InFlight -> Failed (rejected too many times; quarantined)
/// - Failed -> Pending (explicit requeue)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Pending,
    InFlight,
    Synced,
    Failed,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Pending => "pending",
            SyncState::InFlight => "in_flight",
            SyncState::Synced => "synced",
            SyncState::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(SyncState::Pending),
            "in_flight" => Ok(SyncState::InFlight),
            "synced" => Ok(SyncState::Synced),
            "failed" => Ok(SyncState::Failed),
            _ => Err(Error::CorruptedData(format!("unknown sync state '{s}'"))),
        }
    }
}

/// A mutation waiting to be transmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Unique identifier, caller-assigned or generated at enqueue time.
    pub id: String,
    /// Logical producer of the entry, used for labeling and diagnostics.
    pub module: String,
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
    pub sync_state: SyncState,
    /// Number of rejected transmissions so far.
    pub attempts: u32,
}

impl QueueEntry {
    /// Creates a fresh pending entry.
    pub fn new(
        id: String,
        module: String,
        payload: serde_json::Value,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        QueueEntry {
            id,
            module,
            payload,
            enqueued_at,
            sync_state: SyncState::Pending,
            attempts: 0,
        }
    }
}

/// A cached value with creation and expiry times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
    pub size_bytes: u64,
}

impl CacheEntry {
    /// Creates an entry that expires `ttl` after `now_ms`.
    ///
    /// The size counts both key and value bytes.
    pub fn new(key: String, value: Vec<u8>, now_ms: u64, ttl: Duration) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let size_bytes = (key.len() + value.len()) as u64;
        CacheEntry {
            key,
            value,
            created_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(ttl_ms),
            size_bytes,
        }
    }

    /// An expired entry is logically absent.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// An ordered, contiguous slice of pending entries sent as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncBatch {
    /// Position of this batch within its synchronization cycle.
    pub index: usize,
    pub entries: Vec<QueueEntry>,
}

impl SyncBatch {
    /// Splits entries into consecutive batches of at most `batch_size`,
    /// preserving order. A zero batch size is treated as one.
    pub fn partition(entries: Vec<QueueEntry>, batch_size: usize) -> Vec<SyncBatch> {
        let batch_size = batch_size.max(1);
        let mut batches = Vec::with_capacity(entries.len().div_ceil(batch_size));
        let mut current = Vec::with_capacity(batch_size);

        for entry in entries {
            current.push(entry);
            if current.len() == batch_size {
                let index = batches.len();
                batches.push(SyncBatch {
                    index,
                    entries: std::mem::replace(&mut current, Vec::with_capacity(batch_size)),
                });
            }
        }
        if !current.is_empty() {
            let index = batches.len();
            batches.push(SyncBatch {
                index,
                entries: current,
            });
        }

        batches
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct producer modules in first-seen order.
    pub fn modules(&self) -> Vec<&str> {
        let mut modules: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !modules.contains(&entry.module.as_str()) {
                modules.push(&entry.module);
            }
        }
        modules
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
