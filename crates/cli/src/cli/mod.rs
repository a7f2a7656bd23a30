// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::StorageBackend;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Queue backend selectable at init time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    #[default]
    Sqlite,
    Journal,
}

impl From<BackendArg> for StorageBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sqlite => StorageBackend::Sqlite,
            BackendArg::Journal => StorageBackend::Journal,
        }
    }
}

#[derive(Parser)]
#[command(name = "tether")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first local store with a durable outbound queue")]
#[command(
    long_about = "Offline-first local store with a durable outbound queue.\n\n\
    Writes land in a local cache and a pending queue first, then drain to a \
    remote endpoint in batches whenever a connection is available."
)]
pub struct Cli {
    /// Run as if tether was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a store in the current directory
    #[command(after_help = "\
Examples:
  tether init                                Local-only store
  tether init --remote ws://localhost:7890   Store that syncs to a server
  tether init --backend journal              Keep the queue in a JSONL journal")]
    Init {
        /// Directory to initialize (default: current directory)
        #[arg(long)]
        path: Option<String>,

        /// WebSocket endpoint accepting batches (ws:// or wss://)
        #[arg(long)]
        remote: Option<String>,

        /// Where the pending queue is persisted
        #[arg(long, value_enum, default_value = "sqlite")]
        backend: BackendArg,
    },

    /// Add a record to the pending queue
    #[command(after_help = "\
Examples:
  tether enqueue orders '{\"total\": 12}'
  tether enqueue orders '{\"total\": 12}' --id order-42")]
    Enqueue {
        /// Logical module the record belongs to
        #[arg(value_parser = non_empty_string)]
        module: String,

        /// Record payload as JSON
        payload: String,

        /// Use this id instead of a generated one
        #[arg(long, value_parser = non_empty_string)]
        id: Option<String>,
    },

    /// List records waiting to be synced, oldest first
    Pending {
        /// Maximum number of records to show
        #[arg(long, short = 'n')]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List, requeue or discard quarantined records
    Quarantine {
        /// Return records to the pending queue with attempts reset
        #[arg(long, value_name = "IDS", num_args = 1.., conflicts_with = "discard")]
        requeue: Vec<String>,

        /// Delete records permanently
        #[arg(long, value_name = "IDS", num_args = 1..)]
        discard: Vec<String>,
    },

    /// Run one synchronization cycle
    Sync,

    /// Sync periodically until interrupted
    Watch,

    /// Show queue, cache and connection state
    Status,

    /// Read and write the local cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Store a value
    Set(CacheSetArgs),

    /// Print a value
    Get {
        key: String,
    },

    /// Remove a value
    Delete {
        key: String,
    },

    /// Show entry count and size
    Stats,

    /// Remove expired entries
    Purge,
}

#[derive(Args)]
pub struct CacheSetArgs {
    #[arg(value_parser = non_empty_string)]
    pub key: String,

    pub value: String,

    /// Lifetime in milliseconds (default: cache.default_ttl_ms)
    #[arg(long, value_name = "MS")]
    pub ttl: Option<u64>,
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
