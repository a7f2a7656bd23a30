// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether-core: local data layer for offline-first clients
//!
//! This crate provides the durable cache, the pending write queue, their
//! storage backends and the batch wire protocol. Everything here is
//! synchronous; the sync engine that drives it lives in the `tether` crate.

pub mod cache;
pub mod clock;
pub mod db;
pub mod entry;
pub mod error;
pub mod id;
pub mod journal;
pub mod jsonl;
pub mod protocol;
pub mod queue;
pub mod store;

pub use cache::{CacheQuota, CacheStats, LocalCache};
pub use clock::{ClockSource, ManualClock, SystemClock};
pub use db::Database;
pub use entry::{CacheEntry, QueueEntry, SyncBatch, SyncState};
pub use error::{Error, Result};
pub use journal::JournalStore;
pub use protocol::{ClientMessage, ServerMessage};
pub use queue::PendingQueue;
pub use store::{CacheStore, MemoryStore, QueueStore};
