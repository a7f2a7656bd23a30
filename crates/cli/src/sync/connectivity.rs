// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Link quality reporting.
//!
//! The engine only distinguishes offline from online; `Degraded` and `Good`
//! both allow a cycle to run.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;

/// Current quality of the link to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Offline,
    Degraded,
    Good,
}

impl Connectivity {
    /// Whether network I/O should be attempted.
    pub fn is_online(&self) -> bool {
        !matches!(self, Connectivity::Offline)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Offline => "offline",
            Connectivity::Degraded => "degraded",
            Connectivity::Good => "good",
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reports link quality before each synchronization cycle.
pub trait ConnectivityMonitor: Send + Sync {
    /// Probe the link. Failures report [`Connectivity::Offline`].
    fn check_connection(&self) -> Pin<Box<dyn Future<Output = Connectivity> + Send + '_>>;
}

impl<T: ConnectivityMonitor + ?Sized> ConnectivityMonitor for Box<T> {
    fn check_connection(&self) -> Pin<Box<dyn Future<Output = Connectivity> + Send + '_>> {
        (**self).check_connection()
    }
}

/// Monitor that always reports the same link quality.
///
/// `StaticConnectivity(Connectivity::Good)` suits deployments without a
/// probe target; `StaticConnectivity(Connectivity::Offline)` keeps a
/// local-only store from ever attempting network I/O.
#[derive(Debug, Clone, Copy)]
pub struct StaticConnectivity(pub Connectivity);

impl StaticConnectivity {
    pub fn online() -> Self {
        StaticConnectivity(Connectivity::Good)
    }

    pub fn offline() -> Self {
        StaticConnectivity(Connectivity::Offline)
    }
}

impl ConnectivityMonitor for StaticConnectivity {
    fn check_connection(&self) -> Pin<Box<dyn Future<Output = Connectivity> + Send + '_>> {
        let connectivity = self.0;
        Box::pin(async move { connectivity })
    }
}

/// Monitor that times a TCP connect to the remote host.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    /// `host:port` to connect to.
    addr: String,
    timeout: Duration,
    /// Connect latency above this is reported as degraded.
    degraded_after: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration, degraded_after: Duration) -> Self {
        TcpProbe {
            addr: addr.into(),
            timeout,
            degraded_after,
        }
    }

    /// Builds a probe for the host of a `ws://` or `wss://` URL.
    pub fn for_url(url: &str, timeout: Duration, degraded_after: Duration) -> Option<Self> {
        probe_addr(url).map(|addr| Self::new(addr, timeout, degraded_after))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl ConnectivityMonitor for TcpProbe {
    fn check_connection(&self) -> Pin<Box<dyn Future<Output = Connectivity> + Send + '_>> {
        Box::pin(async move {
            let start = Instant::now();
            match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
                Ok(Ok(_stream)) => {
                    let latency = start.elapsed();
                    if latency > self.degraded_after {
                        tracing::debug!("probe {} slow: {:?}", self.addr, latency);
                        Connectivity::Degraded
                    } else {
                        Connectivity::Good
                    }
                }
                Ok(Err(e)) => {
                    tracing::debug!("probe {} failed: {}", self.addr, e);
                    Connectivity::Offline
                }
                Err(_) => {
                    tracing::debug!("probe {} timed out after {:?}", self.addr, self.timeout);
                    Connectivity::Offline
                }
            }
        })
    }
}

/// Extracts `host:port` from a WebSocket URL, filling in the scheme's
/// default port.
pub fn probe_addr(url: &str) -> Option<String> {
    let (rest, default_port) = if let Some(rest) = url.strip_prefix("ws://") {
        (rest, 80)
    } else if let Some(rest) = url.strip_prefix("wss://") {
        (rest, 443)
    } else {
        return None;
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    if host_port.is_empty() {
        return None;
    }

    // A port follows the last colon, unless that colon is inside an IPv6 literal
    let has_port = match host_port.rfind(':') {
        Some(i) => !host_port[i..].contains(']'),
        None => false,
    };
    if has_port {
        Some(host_port.to_string())
    } else {
        Some(format!("{host_port}:{default_port}"))
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
