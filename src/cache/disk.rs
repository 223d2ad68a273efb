//! Filesystem-backed cache generations.
//!
//! Layout under the configured root:
//!
//! ```text
//! caches/
//!   <url-encoded generation name>/
//!     .generation          creation timestamp (RFC 3339)
//!     <sha256 of key>.json one serialized CacheEntry per request identity
//! ```
//!
//! Author: kelexine (<https://github.com/kelexine>)

use super::models::{CacheEntry, CacheKey};
use super::storage::CacheStorage;
use crate::error::{GatewayError, Result};
use crate::network::GatewayResponse;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const MARKER: &str = ".generation";

/// Cache storage that survives restarts.
pub struct DiskCacheStorage {
    root: PathBuf,
}

impl DiskCacheStorage {
    /// Use `<data_dir>/caches` as the storage root, creating it if needed.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let root = data_dir.as_ref().join("caches");
        fs::create_dir_all(&root).await?;
        debug!("Disk cache storage rooted at {}", root.display());
        Ok(Self { root })
    }

    fn generation_dir(&self, name: &str) -> PathBuf {
        self.root.join(urlencoding::encode(name).as_ref())
    }

    fn entry_path(&self, name: &str, key: &CacheKey) -> PathBuf {
        self.generation_dir(name).join(format!("{}.json", key.digest()))
    }

    async fn read_entry(path: &Path) -> Result<Option<CacheEntry>> {
        match fs::read(path).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Restore published targets to what they held before, newest first.
    async fn roll_back(published: Vec<(PathBuf, Option<Vec<u8>>)>) {
        for (target, previous) in published.into_iter().rev() {
            let restored = match previous {
                Some(raw) => fs::write(&target, raw).await,
                None => fs::remove_file(&target).await,
            };
            if let Err(e) = restored {
                warn!("Could not roll back {}: {}", target.display(), e);
            }
        }
    }

    async fn created_at(dir: &Path) -> String {
        fs::read_to_string(dir.join(MARKER)).await.unwrap_or_default()
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let dir = self.generation_dir(name);
        if fs::try_exists(dir.join(MARKER)).await? {
            return Ok(());
        }
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(MARKER), chrono::Utc::now().to_rfc3339()).await?;
        debug!("Created cache generation {} at {}", name, dir.display());
        Ok(())
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.generation_dir(name).join(MARKER)).await?)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut generations = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(item) = dir.next_entry().await? {
            if !item.file_type().await?.is_dir() {
                continue;
            }
            let encoded = item.file_name().to_string_lossy().to_string();
            let name = match urlencoding::decode(&encoded) {
                Ok(name) => name.into_owned(),
                Err(_) => {
                    warn!("Skipping undecodable cache directory {}", encoded);
                    continue;
                }
            };
            let created = Self::created_at(&item.path()).await;
            generations.push((created, name));
        }
        generations.sort();
        Ok(generations.into_iter().map(|(_, name)| name).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let dir = self.generation_dir(name);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(GatewayError::Storage(format!(
                "Failed to delete cache {}: {}",
                name, e
            ))),
        }
    }

    async fn put(&self, name: &str, entry: CacheEntry) -> Result<()> {
        self.put_all(name, vec![entry]).await
    }

    async fn put_all(&self, name: &str, entries: Vec<CacheEntry>) -> Result<()> {
        self.open(name).await?;

        // Stage every entry first so a failure leaves the generation untouched
        let mut staged = Vec::with_capacity(entries.len());
        for entry in &entries {
            let target = self.entry_path(name, &entry.key);
            let tmp = target.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4()));
            let write = async {
                let raw = serde_json::to_vec(entry)?;
                fs::write(&tmp, raw).await?;
                Ok::<_, GatewayError>(())
            };
            if let Err(e) = write.await {
                for (tmp, _) in &staged {
                    let _ = fs::remove_file(tmp).await;
                }
                let _ = fs::remove_file(&tmp).await;
                return Err(GatewayError::Storage(format!(
                    "Failed to stage {} in {}: {}",
                    entry.key.url, name, e
                )));
            }
            staged.push((tmp, target));
        }

        // Publish, remembering what each target held so a failure can be undone
        let mut published: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
        let mut pending = staged.into_iter();
        while let Some((tmp, target)) = pending.next() {
            let publish = async {
                let previous = match fs::read(&target).await {
                    Ok(raw) => Some(raw),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                    Err(e) => return Err(e),
                };
                fs::rename(&tmp, &target).await?;
                Ok::<_, std::io::Error>(previous)
            };
            match publish.await {
                Ok(previous) => published.push((target, previous)),
                Err(e) => {
                    let _ = fs::remove_file(&tmp).await;
                    for (tmp, _) in pending.by_ref() {
                        let _ = fs::remove_file(&tmp).await;
                    }
                    Self::roll_back(published).await;
                    return Err(GatewayError::Storage(format!(
                        "Failed to commit {} in {}: {}",
                        target.display(),
                        name,
                        e
                    )));
                }
            }
        }
        Ok(())
    }

    async fn match_in(&self, name: &str, key: &CacheKey) -> Result<Option<GatewayResponse>> {
        let entry = Self::read_entry(&self.entry_path(name, key)).await?;
        // File names are digests; the stored key is authoritative
        Ok(entry.filter(|e| &e.key == key).map(|e| e.response))
    }

    async fn entries(&self, name: &str) -> Result<Vec<CacheKey>> {
        let mut keys = Vec::new();
        let mut dir = match fs::read_dir(self.generation_dir(name)).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(e.into()),
        };
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(entry) = Self::read_entry(&path).await? {
                keys.push(entry.key);
            }
        }
        Ok(keys)
    }
}
