// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local cache commands.

use std::io::Write;
use std::time::Duration;

use tether_core::LocalCache;

use super::open_store;
use crate::error::{Error, Result};

pub fn set(key: &str, value: &str, ttl_ms: Option<u64>) -> Result<()> {
    let cache = open_store()?.cache()?;
    set_impl(&cache, key, value, ttl_ms)
}

pub(crate) fn set_impl(
    cache: &LocalCache,
    key: &str,
    value: &str,
    ttl_ms: Option<u64>,
) -> Result<()> {
    cache.set(
        key,
        value.as_bytes().to_vec(),
        ttl_ms.map(Duration::from_millis),
    )?;
    Ok(())
}

pub fn get(key: &str) -> Result<()> {
    let cache = open_store()?.cache()?;
    get_impl(&cache, key, &mut std::io::stdout())
}

pub(crate) fn get_impl(cache: &LocalCache, key: &str, out: &mut impl Write) -> Result<()> {
    let value = cache
        .get(key)?
        .ok_or_else(|| Error::KeyNotFound(key.to_string()))?;
    writeln!(out, "{}", String::from_utf8_lossy(&value))?;
    Ok(())
}

pub fn delete(key: &str) -> Result<()> {
    let cache = open_store()?.cache()?;
    delete_impl(&cache, key, &mut std::io::stdout())
}

/// Deleting an absent key is not an error.
pub(crate) fn delete_impl(cache: &LocalCache, key: &str, out: &mut impl Write) -> Result<()> {
    if cache.delete(key)? {
        writeln!(out, "Deleted {}.", key)?;
    } else {
        writeln!(out, "{} was not cached.", key)?;
    }
    Ok(())
}

pub fn stats() -> Result<()> {
    let cache = open_store()?.cache()?;
    stats_impl(&cache, &mut std::io::stdout())
}

pub(crate) fn stats_impl(cache: &LocalCache, out: &mut impl Write) -> Result<()> {
    let stats = cache.stats();
    let quota = cache.quota();
    writeln!(out, "Entries: {} / {}", stats.count, quota.max_count)?;
    writeln!(
        out,
        "Size: {} / {} bytes",
        stats.total_size_bytes, quota.max_bytes
    )?;
    Ok(())
}

pub fn purge() -> Result<()> {
    let cache = open_store()?.cache()?;
    purge_impl(&cache, &mut std::io::stdout())
}

pub(crate) fn purge_impl(cache: &LocalCache, out: &mut impl Write) -> Result<()> {
    let purged = cache.purge_expired()?;
    writeln!(out, "Purged {} expired entries.", purged)?;
    Ok(())
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
