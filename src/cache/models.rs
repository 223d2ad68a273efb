//! Cache keys, stored entries and statistics.

// Author: kelexine (https://github.com/kelexine)

use crate::network::{GatewayResponse, InterceptedRequest};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of a cached request: method plus URL without its fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
}

impl CacheKey {
    /// Key for a GET of `url`.
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".to_string(),
            url: normalize_url(url),
        }
    }

    pub fn from_request(request: &InterceptedRequest) -> Self {
        Self {
            method: request.method.to_ascii_uppercase(),
            url: normalize_url(&request.url),
        }
    }

    /// Stable SHA256 digest used as the on-disk file name.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_bytes());
        hasher.update(b" ");
        hasher.update(self.url.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw.to_string(),
    }
}

/// A stored request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub response: GatewayResponse,
    pub stored_at: chrono::DateTime<chrono::Utc>,
}

impl CacheEntry {
    pub fn new(key: CacheKey, response: GatewayResponse) -> Self {
        Self {
            key,
            response,
            stored_at: chrono::Utc::now(),
        }
    }
}

/// Statistics for cache operations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from a cache generation.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries written.
    pub writes: u64,
    /// Generations deleted by activation sweeps.
    pub generations_deleted: u64,
}
