// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in the tether library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'tether init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid payload: {0}\n  hint: payloads must be valid JSON, e.g. '{{\"total\": 12}}'")]
    InvalidPayload(String),

    #[error("queue entry not found: {0}")]
    EntryNotFound(String),

    #[error("cache key not found: {0}")]
    KeyNotFound(String),

    #[error("sync failed: {0}")]
    Sync(String),

    #[error(transparent)]
    Core(#[from] tether_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for tether operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
