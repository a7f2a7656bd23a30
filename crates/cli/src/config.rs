// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.tether/config.toml`. Every field has a
//! default, so an empty file is a valid local-only configuration:
//! - `[sync]`: batch size, auto-sync interval, send timeout, poison limit
//! - `[cache]`: byte/count quota and default entry lifetime
//! - `[storage]`: queue backend (`sqlite` or `journal`)
//! - `[remote]`: optional WebSocket endpoint; absent means local-only

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tether_core::CacheQuota;

use crate::error::{Error, Result};

const WORK_DIR_NAME: &str = ".tether";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "tether.db";
const JOURNAL_FILE_NAME: &str = "queue.jsonl";

/// Project configuration stored in `.tether/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Remote sync configuration (optional - if absent, runs in local-only mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

/// Batching and scheduling of synchronization cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum entries per transmitted batch.
    pub batch_size: usize,
    /// Period of the auto-sync timer in milliseconds.
    pub auto_sync_interval_ms: u64,
    /// Time allowed for one batch round trip before it counts as rejected.
    pub send_timeout_ms: u64,
    /// Rejections before an entry is quarantined. 0 = never.
    pub max_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            batch_size: 50,
            auto_sync_interval_ms: 30_000,
            send_timeout_ms: 10_000,
            max_attempts: 0,
        }
    }
}

/// Local cache limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub quota_bytes: u64,
    pub quota_count: usize,
    /// Lifetime of entries written without an explicit TTL.
    pub default_ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            quota_bytes: 5 * 1024 * 1024,
            quota_count: 1000,
            default_ttl_ms: 3_600_000,
        }
    }
}

impl CacheConfig {
    pub fn quota(&self) -> CacheQuota {
        CacheQuota {
            max_bytes: self.quota_bytes,
            max_count: self.quota_count,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

/// Where the pending queue is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// `tether.db`, shared with the cache.
    #[default]
    Sqlite,
    /// `queue.jsonl`, an append-only journal.
    Journal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

/// Remote endpoint that accepts batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket server: `ws://...` or `wss://...`.
    pub url: String,
    /// Max time for the connectivity probe's TCP connect (default: 2000).
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Probe latency above which the link counts as degraded (default: 500).
    #[serde(default = "default_degraded_latency_ms")]
    pub degraded_latency_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_degraded_latency_ms() -> u64 {
    500
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        RemoteConfig {
            url: url.into(),
            probe_timeout_ms: default_probe_timeout_ms(),
            degraded_latency_ms: default_degraded_latency_ms(),
        }
    }

    /// Validates that the URL is a WebSocket URL.
    ///
    /// Returns an error message if the URL is invalid.
    pub fn validate_url(&self) -> Option<String> {
        let url = &self.url;
        let rest = url
            .strip_prefix("ws://")
            .or_else(|| url.strip_prefix("wss://"));
        match rest {
            Some(host) if !host.is_empty() && !host.starts_with('/') => None,
            Some(_) => Some(format!("invalid remote URL '{url}': missing host")),
            None => Some(format!(
                "invalid remote URL '{url}': must start with ws:// or wss://"
            )),
        }
    }
}

impl Config {
    /// Checks the values serde cannot express as types.
    pub fn validate(&self) -> Result<()> {
        if self.sync.batch_size == 0 {
            return Err(Error::Config("sync.batch_size must be at least 1".into()));
        }
        if self.sync.auto_sync_interval_ms == 0 {
            return Err(Error::Config(
                "sync.auto_sync_interval_ms must be at least 1".into(),
            ));
        }
        if self.sync.send_timeout_ms == 0 {
            return Err(Error::Config("sync.send_timeout_ms must be at least 1".into()));
        }
        if let Some(remote) = &self.remote {
            if let Some(msg) = remote.validate_url() {
                return Err(Error::Config(msg));
            }
            if remote.probe_timeout_ms == 0 {
                return Err(Error::Config(
                    "remote.probe_timeout_ms must be at least 1".into(),
                ));
            }
        }
        Ok(())
    }

    /// Parses and validates a configuration document.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from the given `.tether/` directory.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        Self::parse(&content)
    }

    /// Saves configuration to the given `.tether/` directory.
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Returns the remote URL if configured.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.url.as_str())
    }

    /// Rejections before quarantine, `None` when unbounded.
    pub fn max_attempts(&self) -> Option<u32> {
        Some(self.sync.max_attempts).filter(|&n| n > 0)
    }
}

/// Find the .tether directory by walking up from the current directory
pub fn find_work_dir() -> Result<PathBuf> {
    let mut current = std::env::current_dir()?;
    loop {
        let work_dir = current.join(WORK_DIR_NAME);
        if work_dir.is_dir() {
            return Ok(work_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Path of the SQLite file holding the cache (and the queue, by default).
pub fn get_db_path(work_dir: &Path) -> PathBuf {
    work_dir.join(DB_FILE_NAME)
}

/// Path of the queue's storage for the configured backend.
pub fn get_queue_path(work_dir: &Path, config: &Config) -> PathBuf {
    match config.storage.backend {
        StorageBackend::Sqlite => get_db_path(work_dir),
        StorageBackend::Journal => work_dir.join(JOURNAL_FILE_NAME),
    }
}

/// Initialize a new .tether directory at the given path
pub fn init_work_dir(path: &Path, config: &Config) -> Result<PathBuf> {
    let work_dir = path.join(WORK_DIR_NAME);

    if work_dir.exists() {
        return Err(Error::AlreadyInitialized(work_dir.display().to_string()));
    }

    config.validate()?;
    fs::create_dir_all(&work_dir)?;
    config.save(&work_dir)?;

    Ok(work_dir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
