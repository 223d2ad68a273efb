// Cache storage backends
// Author: kelexine (https://github.com/kelexine)

use super::models::{CacheEntry, CacheKey};
use crate::error::Result;
use crate::network::GatewayResponse;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Named cache generations holding request/response pairs.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named cache if it does not exist yet.
    async fn open(&self, name: &str) -> Result<()>;

    async fn has(&self, name: &str) -> Result<bool>;

    /// Names of all caches, oldest first.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Remove a cache and everything in it. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Store one entry, replacing any entry with the same key.
    async fn put(&self, name: &str, entry: CacheEntry) -> Result<()>;

    /// Store a batch of entries. Either all of them become visible or none do.
    async fn put_all(&self, name: &str, entries: Vec<CacheEntry>) -> Result<()>;

    /// Look up a key in one cache.
    async fn match_in(&self, name: &str, key: &CacheKey) -> Result<Option<GatewayResponse>>;

    /// Keys stored in one cache.
    async fn entries(&self, name: &str) -> Result<Vec<CacheKey>>;

    /// Look up a key across every cache, oldest first.
    async fn match_any(&self, key: &CacheKey) -> Result<Option<GatewayResponse>> {
        for name in self.keys().await? {
            if let Some(resp) = self.match_in(&name, key).await? {
                return Ok(Some(resp));
            }
        }
        Ok(None)
    }
}

type Generation = HashMap<CacheKey, CacheEntry>;

/// In-process storage. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<Vec<(String, Generation)>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn position(caches: &[(String, Generation)], name: &str) -> Option<usize> {
    caches.iter().position(|(n, _)| n == name)
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let mut caches = self.caches.write();
        if position(&caches, name).is_none() {
            debug!("Creating cache {}", name);
            caches.push((name.to_string(), HashMap::new()));
        }
        Ok(())
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(position(&self.caches.read(), name).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.caches.read().iter().map(|(n, _)| n.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut caches = self.caches.write();
        match position(&caches, name) {
            Some(idx) => {
                caches.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn put(&self, name: &str, entry: CacheEntry) -> Result<()> {
        self.put_all(name, vec![entry]).await
    }

    async fn put_all(&self, name: &str, entries: Vec<CacheEntry>) -> Result<()> {
        let mut caches = self.caches.write();
        let idx = match position(&caches, name) {
            Some(idx) => idx,
            None => {
                caches.push((name.to_string(), HashMap::new()));
                caches.len() - 1
            }
        };
        let generation = &mut caches[idx].1;
        for entry in entries {
            generation.insert(entry.key.clone(), entry);
        }
        Ok(())
    }

    async fn match_in(&self, name: &str, key: &CacheKey) -> Result<Option<GatewayResponse>> {
        let caches = self.caches.read();
        Ok(position(&caches, name)
            .and_then(|idx| caches[idx].1.get(key))
            .map(|entry| entry.response.clone()))
    }

    async fn entries(&self, name: &str) -> Result<Vec<CacheKey>> {
        let caches = self.caches.read();
        Ok(position(&caches, name)
            .map(|idx| caches[idx].1.keys().cloned().collect())
            .unwrap_or_default())
    }
}
