// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    not_initialized = { Error::NotInitialized, "tether init" },
    already_initialized = { Error::AlreadyInitialized("/tmp/.tether".into()), "already initialized" },
    config = { Error::Config("batch_size must be at least 1".into()), "batch_size" },
    invalid_payload = { Error::InvalidPayload("expected value".into()), "hint" },
    entry_not_found = { Error::EntryNotFound("orders-1".into()), "orders-1" },
    key_not_found = { Error::KeyNotFound("user".into()), "user" },
    sync = { Error::Sync("No connection".into()), "sync failed: No connection" },
)]
fn error_display_mentions(err: Error, needle: &str) {
    assert!(err.to_string().contains(needle), "{err}");
}

#[test]
fn core_errors_pass_through_unchanged() {
    let core = tether_core::Error::DuplicateId("orders-1".into());
    let expected = core.to_string();
    let err: Error = core.into();
    assert_eq!(err.to_string(), expected);
}

#[test]
fn toml_errors_convert() {
    let parse = toml::from_str::<toml::Table>("not = = toml").unwrap_err();
    let err: Error = parse.into();
    assert!(matches!(err, Error::Toml(_)));
}
