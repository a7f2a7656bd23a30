// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[test]
fn system_clock_is_after_2020() {
    // 2020-01-01T00:00:00Z
    assert!(SystemClock.now_ms() > 1_577_836_800_000);
}

#[test]
fn manual_clock_advances() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now_ms(), 1_000);

    clock.advance(Duration::from_millis(250));
    assert_eq!(clock.now_ms(), 1_250);

    clock.set(10);
    assert_eq!(clock.now_ms(), 10);
}

#[test]
fn clock_reference_delegates() {
    let clock = ManualClock::new(42);
    let by_ref = &clock;
    assert_eq!(by_ref.now_ms(), 42);
}

#[parameterized(
    epoch = { 0, "1970-01-01T00:00:00+00:00" },
    one_second = { 1_000, "1970-01-01T00:00:01+00:00" },
    recent = { 1_700_000_000_000, "2023-11-14T22:13:20+00:00" },
)]
fn to_datetime_converts(ms: u64, expected: &str) {
    assert_eq!(to_datetime(ms).to_rfc3339(), expected);
}

#[test]
fn to_datetime_clamps_out_of_range() {
    assert_eq!(to_datetime(u64::MAX).timestamp_millis(), 0);
}

#[test]
fn now_matches_now_ms() {
    let clock = ManualClock::new(5_000);
    assert_eq!(clock.now().timestamp_millis(), 5_000);
}
