// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages exchanged with the remote batch endpoint.
//!
//! The protocol is one request, one reply:
//! - Client sends a batch of queue entries
//! - Server answers with an ack for that batch, or an error

use serde::{Deserialize, Serialize};

use crate::entry::{QueueEntry, SyncBatch};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submit a batch of entries for acceptance.
    ///
    /// The server accepts or rejects the batch as a whole.
    Batch {
        /// Client-chosen ID echoed in the Ack.
        batch_id: u64,
        /// Entries in queue order.
        entries: Vec<QueueEntry>,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Verdict on a batch.
    Ack {
        /// Echoed from the Batch message.
        batch_id: u64,
        accepted: bool,
        /// Why the batch was rejected, if the server says.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Error message.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Batch message from a sync batch.
    pub fn batch(batch_id: u64, batch: &SyncBatch) -> Self {
        ClientMessage::Batch {
            batch_id,
            entries: batch.entries.clone(),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates an Ack accepting the batch.
    pub fn accepted(batch_id: u64) -> Self {
        ServerMessage::Ack {
            batch_id,
            accepted: true,
            reason: None,
        }
    }

    /// Creates an Ack rejecting the batch.
    pub fn rejected(batch_id: u64, reason: impl Into<String>) -> Self {
        ServerMessage::Ack {
            batch_id,
            accepted: false,
            reason: Some(reason.into()),
        }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
