// Offline gateway - wiring of cache, network and host
// Author: kelexine (https://github.com/kelexine)

use super::host::Host;
use super::lifecycle::{Registration, WorkerState};
use super::messaging::{NoopSync, SyncTask};
use crate::cache::{CacheManager, CacheStorage};
use crate::config::{GatewayConfig, NotificationConfig};
use crate::error::{GatewayError, Result};
use crate::network::Fetcher;
use parking_lot::Mutex;
use reqwest::Url;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

/// The offline cache gateway.
///
/// Cheap to clone; every clone shares the same cache, registration and
/// background task tracker.
#[derive(Clone)]
pub struct OfflineGateway {
    pub(super) inner: Arc<Inner>,
}

pub(super) struct Inner {
    pub(super) config: GatewayConfig,
    pub(super) notifications: NotificationConfig,
    pub(super) origin: Url,
    pub(super) cache: CacheManager,
    pub(super) fetcher: Arc<dyn Fetcher>,
    pub(super) host: Arc<dyn Host>,
    pub(super) sync_task: Arc<dyn SyncTask>,
    pub(super) registration: Mutex<Registration>,
    pub(super) background: TaskTracker,
    /// Serialises `wait_for_background` callers around the shared tracker.
    pub(super) drain: tokio::sync::Mutex<()>,
}

/// Snapshot reported by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatus {
    pub generation: String,
    pub app_version: String,
    pub state: WorkerState,
    pub skip_waiting: bool,
    pub pending_writes: usize,
}

/// Builder for [`OfflineGateway`].
pub struct GatewayBuilder {
    config: GatewayConfig,
    notifications: NotificationConfig,
    storage: Option<Arc<dyn CacheStorage>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    host: Option<Arc<dyn Host>>,
    sync_task: Arc<dyn SyncTask>,
}

impl GatewayBuilder {
    pub fn notifications(mut self, notifications: NotificationConfig) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn host(mut self, host: Arc<dyn Host>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn sync_task(mut self, sync_task: Arc<dyn SyncTask>) -> Self {
        self.sync_task = sync_task;
        self
    }

    pub fn build(self) -> Result<OfflineGateway> {
        let origin = Url::parse(&self.config.origin).map_err(|e| {
            GatewayError::Config(format!("Invalid origin {}: {}", self.config.origin, e))
        })?;
        let storage = self
            .storage
            .ok_or_else(|| GatewayError::Config("cache storage not set".into()))?;
        let fetcher = self
            .fetcher
            .ok_or_else(|| GatewayError::Config("fetcher not set".into()))?;
        let host = self
            .host
            .ok_or_else(|| GatewayError::Config("host not set".into()))?;

        let cache = CacheManager::new(storage, &self.config.cache_name);

        Ok(OfflineGateway {
            inner: Arc::new(Inner {
                config: self.config,
                notifications: self.notifications,
                origin,
                cache,
                fetcher,
                host,
                sync_task: self.sync_task,
                registration: Mutex::new(Registration::default()),
                background: TaskTracker::new(),
                drain: tokio::sync::Mutex::new(()),
            }),
        })
    }
}

impl OfflineGateway {
    pub fn builder(config: GatewayConfig) -> GatewayBuilder {
        GatewayBuilder {
            config,
            notifications: NotificationConfig::default(),
            storage: None,
            fetcher: None,
            host: None,
            sync_task: Arc::new(NoopSync),
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.inner.cache
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.inner.fetcher
    }

    pub fn state(&self) -> WorkerState {
        self.inner.registration.lock().state()
    }

    /// Whether responses may be written back to the current generation.
    pub(super) fn accepts_writes(&self) -> bool {
        self.inner.registration.lock().accepts_writes()
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.inner.registration.lock().skip_waiting()
    }

    pub fn status(&self) -> GatewayStatus {
        let registration = self.inner.registration.lock();
        GatewayStatus {
            generation: self.inner.cache.current_generation().to_string(),
            app_version: self.inner.config.app_version.clone(),
            state: registration.state(),
            skip_waiting: registration.skip_waiting(),
            pending_writes: self.inner.background.len(),
        }
    }

    /// Resolve a manifest entry or path against the application origin.
    pub fn resolve(&self, path_or_url: &str) -> Result<String> {
        self.inner
            .origin
            .join(path_or_url)
            .map(|u| u.to_string())
            .map_err(|e| GatewayError::InvalidRequest(format!("Cannot resolve {}: {}", path_or_url, e)))
    }

    /// Wait until every background cache write spawned so far has finished.
    ///
    /// Concurrent callers drain one at a time, so a reopen by one never
    /// leaves another waiting on an open tracker.
    pub async fn wait_for_background(&self) {
        let _drain = self.inner.drain.lock().await;
        let tracker = &self.inner.background;
        tracker.close();
        tracker.wait().await;
        tracker.reopen();
    }

    pub(super) fn spawn_background<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.inner.background.spawn(task);
    }
}
