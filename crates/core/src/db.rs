// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed storage for the pending queue and the local cache.
//!
//! One [`Database`] file can hold both tables. The queue and the cache each
//! take their own handle, so open the same path twice to share a file.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use crate::entry::{CacheEntry, QueueEntry, SyncState};
use crate::error::{Error, Result};
use crate::store::{CacheStore, QueueStore};

/// SQL schema for the local data layer.
pub const SCHEMA: &str = r#"
-- Pending writes, ordered by insertion
CREATE TABLE IF NOT EXISTS queue_entries (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    module TEXT NOT NULL,
    payload TEXT NOT NULL,
    enqueued_at TEXT NOT NULL,
    sync_state TEXT NOT NULL DEFAULT 'pending',
    attempts INTEGER NOT NULL DEFAULT 0
);

-- Read-mostly cached values
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    created_at_ms INTEGER NOT NULL,
    expires_at_ms INTEGER NOT NULL,
    size_bytes INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_queue_state ON queue_entries(sync_state);
CREATE INDEX IF NOT EXISTS idx_cache_expires ON cache_entries(expires_at_ms);
"#;

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Parse a JSON payload from the database.
fn parse_payload(value: &str) -> std::result::Result<serde_json::Value, rusqlite::Error> {
    serde_json::from_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// SQLite integers are signed; clamp rather than wrap.
fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_int(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// SQLite database handle.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) a database file and applies the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        // WAL lets the queue and cache handles share one file
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Self::init(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }
}

impl QueueStore for Database {
    fn load(&mut self) -> Result<Vec<QueueEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, module, payload, enqueued_at, sync_state, attempts
             FROM queue_entries ORDER BY seq",
        )?;
        let entries = stmt
            .query_map([], |row| {
                let payload: String = row.get(2)?;
                let enqueued_at: String = row.get(3)?;
                let sync_state: String = row.get(4)?;
                Ok(QueueEntry {
                    id: row.get(0)?,
                    module: row.get(1)?,
                    payload: parse_payload(&payload)?,
                    enqueued_at: parse_timestamp(&enqueued_at, "enqueued_at")?,
                    sync_state: parse_db::<SyncState>(&sync_state, "sync_state")?,
                    attempts: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn append(&mut self, entry: &QueueEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO queue_entries (id, module, payload, enqueued_at, sync_state, attempts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.module,
                serde_json::to_string(&entry.payload)?,
                entry.enqueued_at.to_rfc3339(),
                entry.sync_state.as_str(),
                entry.attempts,
            ],
        )?;
        Ok(())
    }

    fn update(&mut self, entries: &[QueueEntry]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE queue_entries SET sync_state = ?1, attempts = ?2 WHERE id = ?3",
            )?;
            for entry in entries {
                stmt.execute(params![entry.sync_state.as_str(), entry.attempts, entry.id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn remove(&mut self, ids: &[String]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM queue_entries WHERE id = ?1")?;
            for id in ids {
                stmt.execute(params![id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl CacheStore for Database {
    fn load(&mut self) -> Result<Vec<CacheEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value, created_at_ms, expires_at_ms, size_bytes
             FROM cache_entries ORDER BY created_at_ms, key",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(CacheEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    created_at_ms: from_sql_int(row.get(2)?),
                    expires_at_ms: from_sql_int(row.get(3)?),
                    size_bytes: from_sql_int(row.get(4)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn replace(&mut self, evict: &[String], entry: &CacheEntry) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM cache_entries WHERE key = ?1")?;
            for key in evict {
                stmt.execute(params![key])?;
            }
        }
        tx.execute(
            "INSERT INTO cache_entries (key, value, created_at_ms, expires_at_ms, size_bytes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                created_at_ms = excluded.created_at_ms,
                expires_at_ms = excluded.expires_at_ms,
                size_bytes = excluded.size_bytes",
            params![
                entry.key,
                entry.value,
                to_sql_int(entry.created_at_ms),
                to_sql_int(entry.expires_at_ms),
                to_sql_int(entry.size_bytes),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove(&mut self, keys: &[String]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM cache_entries WHERE key = ?1")?;
            for key in keys {
                stmt.execute(params![key])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
