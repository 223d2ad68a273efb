// Cache manager - generation-aware lookups and writes
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::{CacheEntry, CacheKey, CacheStats};
use crate::cache::storage::CacheStorage;
use crate::error::Result;
use crate::metrics;
use crate::network::{GatewayResponse, InterceptedRequest};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Cache manager bound to the current generation
#[derive(Clone)]
pub struct CacheManager {
    storage: Arc<dyn CacheStorage>,
    /// Version string of the current generation
    current: Arc<str>,
    stats: Arc<RwLock<CacheStats>>,
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(storage: Arc<dyn CacheStorage>, current: &str) -> Self {
        Self {
            storage,
            current: Arc::from(current),
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    pub fn current_generation(&self) -> &str {
        &self.current
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Look a request up in every visible generation
    pub async fn lookup(&self, request: &InterceptedRequest) -> Result<Option<GatewayResponse>> {
        self.lookup_key(&CacheKey::from_request(request)).await
    }

    /// Look up a GET of `url` in every visible generation
    pub async fn lookup_url(&self, url: &str) -> Result<Option<GatewayResponse>> {
        self.lookup_key(&CacheKey::get(url)).await
    }

    async fn lookup_key(&self, key: &CacheKey) -> Result<Option<GatewayResponse>> {
        let found = self.storage.match_any(key).await?;
        if found.is_some() {
            debug!("Cache hit: {}", key.url);
            self.stats.write().await.hits += 1;
            metrics::record_cache_hit();
        } else {
            debug!("Cache miss: {}", key.url);
            self.stats.write().await.misses += 1;
            metrics::record_cache_miss();
        }
        Ok(found)
    }

    /// Store a response in the current generation, replacing any previous value
    pub async fn store(&self, request: &InterceptedRequest, response: GatewayResponse) -> Result<()> {
        let entry = CacheEntry::new(CacheKey::from_request(request), response);
        debug!("Storing {} in {}", entry.key.url, self.current);
        self.storage.put(&self.current, entry).await?;
        self.stats.write().await.writes += 1;
        metrics::record_cache_write();
        Ok(())
    }

    /// Open the current generation
    pub async fn open_current(&self) -> Result<()> {
        self.storage.open(&self.current).await
    }

    /// Commit a batch of entries to the current generation at once
    pub async fn commit(&self, entries: Vec<CacheEntry>) -> Result<()> {
        let count = entries.len() as u64;
        self.storage.put_all(&self.current, entries).await?;
        self.stats.write().await.writes += count;
        for _ in 0..count {
            metrics::record_cache_write();
        }
        Ok(())
    }

    /// Delete every generation except the current one.
    /// Deletions run concurrently; returns the names that were removed.
    pub async fn sweep_stale(&self) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name.as_str() != &*self.current)
            .collect();

        let results = join_all(stale.iter().map(|name| async move {
            info!("Deleting stale cache generation: {}", name);
            (name, self.storage.delete(name).await)
        }))
        .await;

        let mut deleted = Vec::new();
        for (name, result) in results {
            match result {
                Ok(true) => deleted.push(name.clone()),
                Ok(false) => debug!("Cache {} was already gone", name),
                Err(e) => {
                    warn!("Failed to delete cache {}: {}", name, e);
                    return Err(e);
                }
            }
        }

        self.stats.write().await.generations_deleted += deleted.len() as u64;
        metrics::record_generations_deleted(deleted.len());
        Ok(deleted)
    }

    /// Whether the current generation has been created
    pub async fn current_exists(&self) -> Result<bool> {
        self.storage.has(&self.current).await
    }

    /// Remove the current generation entirely
    pub async fn discard_current(&self) -> Result<bool> {
        info!("Discarding cache generation: {}", self.current);
        self.storage.delete(&self.current).await
    }

    /// Names of all generations, oldest first
    pub async fn generations(&self) -> Result<Vec<String>> {
        self.storage.keys().await
    }

    /// Number of entries in the current generation
    pub async fn current_entry_count(&self) -> Result<usize> {
        Ok(self.storage.entries(&self.current).await?.len())
    }

    /// Get cache statistics
    pub async fn get_stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }
}
