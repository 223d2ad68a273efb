// Cache management module
// Author: kelexine (https://github.com/kelexine)

pub mod disk;
pub mod manager;
pub mod models;
pub mod storage;

pub use disk::DiskCacheStorage;
pub use manager::CacheManager;
pub use models::{CacheEntry, CacheKey, CacheStats};
pub use storage::{CacheStorage, MemoryCacheStorage};

use crate::config::CacheStorageConfig;
use crate::error::{GatewayError, Result};
use std::sync::Arc;

/// Build the storage backend selected in configuration
pub async fn open_storage(config: &CacheStorageConfig) -> Result<Arc<dyn CacheStorage>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryCacheStorage::new())),
        "disk" => Ok(Arc::new(DiskCacheStorage::new(&config.data_dir).await?)),
        other => Err(GatewayError::Config(format!("unknown cache backend '{}'", other))),
    }
}
