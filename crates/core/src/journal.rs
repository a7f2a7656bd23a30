// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL journal backing for the pending queue.
//!
//! Every queue mutation is one fsynced line. Replaying the journal front to
//! back rebuilds the queue in insertion order. The file is compacted on load
//! and whenever dead records outnumber live entries.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entry::{QueueEntry, SyncState};
use crate::error::Result;
use crate::jsonl;
use crate::store::QueueStore;

/// Below this many dead records the journal is never rewritten.
const COMPACT_MIN_DEAD: usize = 64;

/// One line of the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum JournalRecord {
    Enqueued {
        entry: QueueEntry,
    },
    State {
        id: String,
        sync_state: SyncState,
        attempts: u32,
    },
    Removed {
        id: String,
    },
}

/// Pending queue persisted as a JSONL journal.
pub struct JournalStore {
    path: PathBuf,
    /// Ids of entries currently alive in the journal.
    live: HashSet<String>,
    /// Records that no longer describe a live entry's latest state.
    dead: usize,
}

impl JournalStore {
    /// Create or open a journal at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(JournalStore {
            path,
            live: HashSet::new(),
            dead: 0,
        })
    }

    /// Returns the path to the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replay(&self) -> Result<Vec<QueueEntry>> {
        let (records, torn) = jsonl::read_recovering::<JournalRecord>(&self.path)?;
        if torn {
            tracing::warn!(
                "dropping torn final record in queue journal {}",
                self.path.display()
            );
        }

        let mut entries: Vec<Option<QueueEntry>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            match record {
                JournalRecord::Enqueued { entry } => {
                    index.insert(entry.id.clone(), entries.len());
                    entries.push(Some(entry));
                }
                JournalRecord::State {
                    id,
                    sync_state,
                    attempts,
                } => {
                    if let Some(Some(entry)) = index.get(&id).and_then(|&i| entries.get_mut(i)) {
                        entry.sync_state = sync_state;
                        entry.attempts = attempts;
                    }
                }
                JournalRecord::Removed { id } => {
                    if let Some(i) = index.remove(&id) {
                        entries[i] = None;
                    }
                }
            }
        }

        Ok(entries.into_iter().flatten().collect())
    }

    /// Rewrites the journal as one record per live entry.
    fn compact(&mut self, entries: &[QueueEntry]) -> Result<()> {
        let records: Vec<JournalRecord> = entries
            .iter()
            .map(|entry| JournalRecord::Enqueued {
                entry: entry.clone(),
            })
            .collect();
        jsonl::write_all(&self.path, &records)?;

        self.live = entries.iter().map(|e| e.id.clone()).collect();
        self.dead = 0;
        tracing::debug!(
            "compacted queue journal {} to {} entries",
            self.path.display(),
            entries.len()
        );
        Ok(())
    }

    fn maybe_compact(&mut self) -> Result<()> {
        if self.dead >= COMPACT_MIN_DEAD && self.dead > self.live.len() {
            let entries = self.replay()?;
            self.compact(&entries)?;
        }
        Ok(())
    }
}

impl QueueStore for JournalStore {
    fn load(&mut self) -> Result<Vec<QueueEntry>> {
        let entries = self.replay()?;
        self.compact(&entries)?;
        Ok(entries)
    }

    fn append(&mut self, entry: &QueueEntry) -> Result<()> {
        jsonl::append(
            &self.path,
            &JournalRecord::Enqueued {
                entry: entry.clone(),
            },
        )?;
        self.live.insert(entry.id.clone());
        Ok(())
    }

    fn update(&mut self, entries: &[QueueEntry]) -> Result<()> {
        let records: Vec<JournalRecord> = entries
            .iter()
            .filter(|e| self.live.contains(&e.id))
            .map(|e| JournalRecord::State {
                id: e.id.clone(),
                sync_state: e.sync_state,
                attempts: e.attempts,
            })
            .collect();
        jsonl::append_many(&self.path, &records)?;
        self.dead += records.len();
        self.maybe_compact()
    }

    fn remove(&mut self, ids: &[String]) -> Result<()> {
        let records: Vec<JournalRecord> = ids
            .iter()
            .filter(|id| self.live.contains(*id))
            .map(|id| JournalRecord::Removed { id: id.clone() })
            .collect();
        jsonl::append_many(&self.path, &records)?;
        for record in &records {
            if let JournalRecord::Removed { id } = record {
                self.live.remove(id);
            }
        }
        // The removal record and the enqueue record it cancels are both dead.
        self.dead += records.len() * 2;
        self.maybe_compact()
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
