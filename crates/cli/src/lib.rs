// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether - an offline-first local data layer.
//!
//! This crate provides the sync side of the `tether` CLI tool: the batch
//! [`SyncEngine`](sync::SyncEngine), its connectivity and remote sink
//! adapters, and the project configuration stored in `.tether/`.
//!
//! # Main Components
//!
//! - [`sync`] - Batched delivery of the pending queue to a remote sink
//! - [`Config`] - Batch size, quotas, storage backend and remote endpoint
//! - [`Error`] - Error types for all operations
//!
//! Storage, the cache and the queue live in `tether_core`.
//!
//! # Embedding
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tether::sync::{EngineConfig, SyncEngine, TcpProbe, WebSocketSink};
//! use tether_core::{Database, PendingQueue, SystemClock};
//!
//! let clock = Arc::new(SystemClock);
//! let queue = Arc::new(PendingQueue::open(Box::new(Database::open(path)?), clock.clone())?);
//! let probe = TcpProbe::for_url(url, timeout, degraded_after).unwrap();
//! let engine = Arc::new(SyncEngine::new(queue, probe, WebSocketSink::new(url), clock, EngineConfig::default()));
//! engine.start_auto_sync();
//! ```

mod cli;
mod commands;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{BackendArg, CacheCommand, CacheSetArgs, Cli, Command, OutputFormat};
pub use config::{find_work_dir, get_db_path, get_queue_path, init_work_dir, Config};
pub use error::{Error, Result};

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Init {
            path,
            remote,
            backend,
        } => commands::init::run(path, remote, backend.into()),
        Command::Enqueue {
            module,
            payload,
            id,
        } => commands::queue::enqueue(&module, &payload, id.as_deref()),
        Command::Pending { limit, output } => commands::queue::pending(limit, output),
        Command::Quarantine { requeue, discard } => {
            commands::queue::quarantine(&requeue, &discard)
        }
        Command::Sync => commands::sync::once(),
        Command::Watch => commands::sync::watch(),
        Command::Status => commands::status::run(),
        Command::Cache(cmd) => match cmd {
            CacheCommand::Set(args) => commands::cache::set(&args.key, &args.value, args.ttl),
            CacheCommand::Get { key } => commands::cache::get(&key),
            CacheCommand::Delete { key } => commands::cache::delete(&key),
            CacheCommand::Stats => commands::cache::stats(),
            CacheCommand::Purge => commands::cache::purge(),
        },
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
