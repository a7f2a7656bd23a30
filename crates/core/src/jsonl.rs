// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL (JSON Lines) file utilities.
//!
//! Provides durable append-only storage for JSON-serializable records.
//! Each record is stored as a single JSON line with fsync for durability.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

/// Appends a record to a JSONL file with fsync for durability.
pub fn append<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let json = serde_json::to_string(record)?;
    writeln!(file, "{json}")?;
    file.sync_all()?;

    Ok(())
}

/// Appends several records with a single fsync.
pub fn append_many<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut buf = String::new();
    for record in records {
        buf.push_str(&serde_json::to_string(record)?);
        buf.push('\n');
    }
    file.write_all(buf.as_bytes())?;
    file.sync_all()?;

    Ok(())
}

/// Reads all records, tolerating a torn final line.
///
/// A crash in the middle of [`append`] can leave a partial last line. That
/// line is dropped and reported through the returned flag. A malformed line
/// anywhere else is corruption and fails the read.
pub fn read_recovering<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, bool)> {
    if !path.exists() {
        return Ok((Vec::new(), false));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader
        .lines()
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect();

    let mut records = Vec::with_capacity(lines.len());
    let last = lines.len().saturating_sub(1);
    for (idx, line) in lines.iter().enumerate() {
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(_) if idx == last => return Ok((records, true)),
            Err(e) => {
                return Err(Error::CorruptedData(format!(
                    "{}: line {}: {e}",
                    path.display(),
                    idx + 1
                )))
            }
        }
    }

    Ok((records, false))
}

/// Writes all records to a JSONL file, replacing existing content.
///
/// The records go to a sibling temp file that is renamed over the target, so
/// a crash leaves either the old or the new content.
pub fn write_all<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let tmp = path.with_extension("jsonl.tmp");
    let mut file = File::create(&tmp)?;

    for record in records {
        let json = serde_json::to_string(record)?;
        writeln!(file, "{json}")?;
    }
    file.sync_all()?;
    std::fs::rename(&tmp, path)?;

    Ok(())
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
