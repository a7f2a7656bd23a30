// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod cache;
pub mod init;
pub mod queue;
pub mod status;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tether_core::{
    ClockSource, Database, JournalStore, LocalCache, PendingQueue, QueueStore, SystemClock,
};

use crate::config::{find_work_dir, get_db_path, get_queue_path, Config, StorageBackend};
use crate::error::Result;
use crate::sync::{
    ConnectivityMonitor, EngineConfig, RemoteSink, StaticConnectivity, SyncEngine, TcpProbe,
    Unconfigured, WebSocketSink,
};

/// Engine over whatever monitor and sink the configuration selects.
pub type Engine = SyncEngine<Box<dyn ConnectivityMonitor>, Box<dyn RemoteSink>>;

/// An initialized `.tether/` directory and its configuration.
pub struct Store {
    pub work_dir: PathBuf,
    pub config: Config,
    pub clock: Arc<dyn ClockSource>,
}

/// Helper to open the store from the current context.
pub fn open_store() -> Result<Store> {
    Store::open(find_work_dir()?, Arc::new(SystemClock))
}

impl Store {
    pub fn open(work_dir: PathBuf, clock: Arc<dyn ClockSource>) -> Result<Self> {
        let config = Config::load(&work_dir)?;
        Ok(Store {
            work_dir,
            config,
            clock,
        })
    }

    /// Opens the pending queue on the configured backend.
    pub fn queue(&self) -> Result<Arc<PendingQueue>> {
        let path = get_queue_path(&self.work_dir, &self.config);
        let backing: Box<dyn QueueStore> = match self.config.storage.backend {
            StorageBackend::Sqlite => Box::new(Database::open(&path)?),
            StorageBackend::Journal => Box::new(JournalStore::open(&path)?),
        };
        let queue = PendingQueue::open(backing, Arc::clone(&self.clock))?
            .with_max_attempts(self.config.max_attempts());
        Ok(Arc::new(queue))
    }

    /// Opens the cache, which always lives in the SQLite file.
    pub fn cache(&self) -> Result<LocalCache> {
        let db = Database::open(&get_db_path(&self.work_dir))?;
        let cache = LocalCache::open(
            Box::new(db),
            Arc::clone(&self.clock),
            self.config.cache.quota(),
            self.config.cache.default_ttl(),
        )?;
        Ok(cache)
    }

    /// Connectivity source: a TCP probe of the remote host, or permanently
    /// offline without a remote.
    pub fn monitor(&self) -> Box<dyn ConnectivityMonitor> {
        let Some(remote) = &self.config.remote else {
            return Box::new(StaticConnectivity::offline());
        };
        let probe = TcpProbe::for_url(
            &remote.url,
            Duration::from_millis(remote.probe_timeout_ms),
            Duration::from_millis(remote.degraded_latency_ms),
        );
        match probe {
            Some(probe) => Box::new(probe),
            // Nothing to probe; let the sink find out
            None => Box::new(StaticConnectivity::online()),
        }
    }

    pub fn sink(&self) -> Box<dyn RemoteSink> {
        match &self.config.remote {
            Some(remote) => Box::new(WebSocketSink::new(remote.url.as_str())),
            None => Box::new(Unconfigured),
        }
    }

    pub fn engine(&self, queue: Arc<PendingQueue>) -> Engine {
        SyncEngine::new(
            queue,
            self.monitor(),
            self.sink(),
            Arc::clone(&self.clock),
            EngineConfig::from(&self.config.sync),
        )
    }
}

/// Runtime for commands that talk to the network.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(rt)
}
