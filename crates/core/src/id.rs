// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue entry id generation.

use sha2::{Digest, Sha256};

/// Generate an entry ID from module, enqueue time, sequence number and payload.
/// Format: {module}-{hash} where hash is first 8 hex chars of SHA256 over the inputs.
pub fn generate_id(module: &str, enqueued_at_ms: u64, seq: u64, payload: &serde_json::Value) -> String {
    let input = format!("{module}\n{enqueued_at_ms}\n{seq}\n{payload}");
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..4]);
    format!("{}-{}", slug(module), short_hash)
}

/// Generate a unique ID, handling collisions by appending an incrementing suffix.
pub fn generate_unique_id<F>(
    module: &str,
    enqueued_at_ms: u64,
    seq: u64,
    payload: &serde_json::Value,
    exists: F,
) -> String
where
    F: Fn(&str) -> bool,
{
    let base_id = generate_id(module, enqueued_at_ms, seq, payload);

    if !exists(&base_id) {
        return base_id;
    }

    let mut suffix = 2;
    loop {
        let id = format!("{}-{}", base_id, suffix);
        if !exists(&id) {
            return id;
        }
        suffix += 1;
    }
}

/// Lowercase the module name and replace anything outside `[a-z0-9_]` with `_`.
fn slug(module: &str) -> String {
    let slug: String = module
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if slug.is_empty() {
        "entry".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
