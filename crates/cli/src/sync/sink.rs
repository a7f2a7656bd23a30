// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote batch acceptance.
//!
//! Provides a trait-based sink layer that enables:
//! - Real WebSocket delivery for production
//! - Mock sinks for unit testing

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use tether_core::protocol::{ClientMessage, ServerMessage};
use tether_core::SyncBatch;

/// Error type for sink operations.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The server answered with an error message instead of an ack.
    #[error("server error: {0}")]
    Server(String),

    /// No remote endpoint is configured.
    #[error("no remote configured")]
    NotConfigured,
}

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Accepts or rejects batches as a whole.
pub trait RemoteSink: Send + Sync {
    /// Deliver one batch.
    ///
    /// Returns `Ok(true)` when the remote side accepted every entry and
    /// `Ok(false)` when it rejected the batch. Errors are treated as a
    /// rejection by the caller.
    fn send_batch<'a>(
        &'a self,
        batch: &'a SyncBatch,
    ) -> Pin<Box<dyn Future<Output = SinkResult<bool>> + Send + 'a>>;
}

impl<T: RemoteSink + ?Sized> RemoteSink for Box<T> {
    fn send_batch<'a>(
        &'a self,
        batch: &'a SyncBatch,
    ) -> Pin<Box<dyn Future<Output = SinkResult<bool>> + Send + 'a>> {
        (**self).send_batch(batch)
    }
}

/// Sink for stores without a remote endpoint. Every delivery fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl RemoteSink for Unconfigured {
    fn send_batch<'a>(
        &'a self,
        _batch: &'a SyncBatch,
    ) -> Pin<Box<dyn Future<Output = SinkResult<bool>> + Send + 'a>> {
        Box::pin(async { Err(SinkError::NotConfigured) })
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket sink implementation using tokio-tungstenite.
///
/// Connects on first use and keeps the connection for later batches. Any
/// transport failure drops the connection so the next batch reconnects.
pub struct WebSocketSink {
    url: String,
    /// The WebSocket connection, if connected.
    ws: Mutex<Option<WsStream>>,
    next_batch_id: AtomicU64,
}

impl WebSocketSink {
    /// Create a new WebSocket sink for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        WebSocketSink {
            url: url.into(),
            ws: Mutex::new(None),
            next_batch_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check if connected.
    pub async fn is_connected(&self) -> bool {
        self.ws.lock().await.is_some()
    }

    /// Close the connection, if any.
    pub async fn disconnect(&self) {
        if let Some(mut ws) = self.ws.lock().await.take() {
            let _ = ws.close(None).await;
        }
    }

    async fn connect(&self) -> SinkResult<WsStream> {
        let (ws, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| SinkError::ConnectionFailed(e.to_string()))?;
        tracing::debug!("connected to {}", self.url);
        Ok(ws)
    }
}

/// Sends the batch and waits for the ack carrying its id.
///
/// Acks for other ids belong to earlier batches whose wait was abandoned
/// and are skipped.
async fn exchange(ws: &mut WsStream, batch_id: u64, msg: ClientMessage) -> SinkResult<bool> {
    let json = msg
        .to_json()
        .map_err(|e| SinkError::SerializationError(e.to_string()))?;

    ws.send(Message::Text(json.into()))
        .await
        .map_err(|e| SinkError::SendFailed(e.to_string()))?;

    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                let reply = ServerMessage::from_json(&text)
                    .map_err(|e| SinkError::SerializationError(e.to_string()))?;
                match reply {
                    ServerMessage::Ack {
                        batch_id: acked,
                        accepted,
                        reason,
                    } if acked == batch_id => {
                        if let Some(reason) = reason {
                            tracing::warn!("batch {} rejected: {}", batch_id, reason);
                        }
                        return Ok(accepted);
                    }
                    ServerMessage::Ack { batch_id: stale, .. } => {
                        tracing::debug!("ignoring ack for stale batch {}", stale);
                    }
                    ServerMessage::Error { message } => {
                        return Err(SinkError::Server(message));
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => return Err(SinkError::ConnectionClosed),
            Some(Ok(_)) => {
                // Ignore ping/pong and binary frames, continue waiting
                continue;
            }
            Some(Err(e)) => return Err(SinkError::ReceiveFailed(e.to_string())),
        }
    }
}

impl RemoteSink for WebSocketSink {
    fn send_batch<'a>(
        &'a self,
        batch: &'a SyncBatch,
    ) -> Pin<Box<dyn Future<Output = SinkResult<bool>> + Send + 'a>> {
        Box::pin(async move {
            let mut guard = self.ws.lock().await;
            let ws = match guard.take() {
                Some(ws) => ws,
                None => self.connect().await?,
            };
            let ws = guard.insert(ws);

            let batch_id = self.next_batch_id.fetch_add(1, Ordering::Relaxed);
            let result = exchange(ws, batch_id, ClientMessage::batch(batch_id, batch)).await;
            if result.is_err() {
                // Connection is suspect, clear it
                *guard = None;
            }
            result
        })
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
