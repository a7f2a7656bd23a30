// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronization of the pending queue with a remote endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  SyncEngine  │────►│  RemoteSink  │────►│   Remote    │
//! │  (batches)   │◄────│   (trait)    │◄────│   Server    │
//! └──────────────┘     └──────────────┘     └─────────────┘
//!        │    │
//!        │    └──────► ConnectivityMonitor (trait)
//!        ▼
//! ┌──────────────┐
//! │ PendingQueue │  (durable, FIFO)
//! └──────────────┘
//! ```
//!
//! # Features
//!
//! - Batched delivery with per-batch acknowledgement
//! - Connectivity check before each cycle
//! - Single-flight cycles and an optional periodic timer
//! - Injectable monitor and sink traits for testing

mod connectivity;
mod engine;
mod sink;

pub use connectivity::{probe_addr, Connectivity, ConnectivityMonitor, StaticConnectivity, TcpProbe};
pub use engine::{
    EngineConfig, SyncEngine, SyncPhase, SyncResult, NO_CONNECTION, SYNC_IN_PROGRESS,
};
pub use sink::{RemoteSink, SinkError, SinkResult, Unconfigured, WebSocketSink};

#[cfg(test)]
mod test_helpers;
