// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

fn entry(id: &str, module: &str) -> QueueEntry {
    QueueEntry::new(
        id.to_string(),
        module.to_string(),
        json!({ "id": id }),
        crate::clock::to_datetime(1_000),
    )
}

fn entries(n: usize) -> Vec<QueueEntry> {
    (0..n).map(|i| entry(&format!("e{i}"), "orders")).collect()
}

#[parameterized(
    pending = { SyncState::Pending, "pending" },
    in_flight = { SyncState::InFlight, "in_flight" },
    synced = { SyncState::Synced, "synced" },
    failed = { SyncState::Failed, "failed" },
)]
fn sync_state_string_forms(state: SyncState, expected: &str) {
    assert_eq!(state.to_string(), expected);
    assert_eq!(expected.parse::<SyncState>().unwrap(), state);
    assert_eq!(serde_json::to_string(&state).unwrap(), format!("\"{expected}\""));
}

#[test]
fn sync_state_rejects_unknown() {
    let err = "done".parse::<SyncState>().unwrap_err();
    assert!(matches!(err, Error::CorruptedData(_)));
}

#[test]
fn new_queue_entry_is_pending() {
    let e = entry("e1", "orders");
    assert_eq!(e.sync_state, SyncState::Pending);
    assert_eq!(e.attempts, 0);
}

#[test]
fn cache_entry_size_and_expiry() {
    let e = CacheEntry::new("key".into(), vec![0u8; 7], 1_000, Duration::from_millis(10));
    assert_eq!(e.size_bytes, 10);
    assert_eq!(e.expires_at_ms, 1_010);
    assert!(!e.is_expired(1_009));
    assert!(e.is_expired(1_010));
    assert!(e.is_expired(2_000));
}

#[test]
fn cache_entry_huge_ttl_saturates() {
    let e = CacheEntry::new("k".into(), Vec::new(), 5, Duration::MAX);
    assert_eq!(e.expires_at_ms, u64::MAX);
    assert!(!e.is_expired(u64::MAX - 1));
}

#[parameterized(
    empty = { 0, 5, vec![] },
    exact = { 10, 5, vec![5, 5] },
    remainder = { 12, 5, vec![5, 5, 2] },
    single = { 3, 5, vec![3] },
    zero_size = { 2, 0, vec![1, 1] },
)]
fn partition_sizes(count: usize, batch_size: usize, expected: Vec<usize>) {
    let batches = SyncBatch::partition(entries(count), batch_size);
    let sizes: Vec<usize> = batches.iter().map(SyncBatch::len).collect();
    assert_eq!(sizes, expected);
}

#[test]
fn partition_preserves_order_and_indexes() {
    let batches = SyncBatch::partition(entries(7), 3);

    let indexes: Vec<usize> = batches.iter().map(|b| b.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);

    let ids: Vec<String> = batches.iter().flat_map(SyncBatch::ids).collect();
    let expected: Vec<String> = (0..7).map(|i| format!("e{i}")).collect();
    assert_eq!(ids, expected);
}

#[test]
fn batch_modules_are_distinct_in_order() {
    let batch = SyncBatch {
        index: 0,
        entries: vec![
            entry("a", "orders"),
            entry("b", "visits"),
            entry("c", "orders"),
        ],
    };
    assert_eq!(batch.modules(), vec!["orders", "visits"]);
    assert!(!batch.is_empty());
}
