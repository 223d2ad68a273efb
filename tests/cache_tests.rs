// Disk-backed generation tests
// Author: kelexine (https://github.com/kelexine)

mod common;

use common::{gateway_config, url, MockFetcher, RecordingHost};
use offline_gateway::cache::{open_storage, CacheStorage, DiskCacheStorage};
use offline_gateway::config::CacheStorageConfig;
use offline_gateway::network::InterceptedRequest;
use offline_gateway::worker::{FetchOutcome, OfflineGateway, ResponseSource};
use std::sync::Arc;

async fn disk_gateway(
    dir: &std::path::Path,
    cache_name: &str,
    fetcher: Arc<MockFetcher>,
) -> OfflineGateway {
    let storage = Arc::new(DiskCacheStorage::new(dir).await.unwrap());
    OfflineGateway::builder(gateway_config(cache_name, &["/", "/a.json"]))
        .storage(storage)
        .fetcher(fetcher)
        .host(RecordingHost::new())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_installed_generation_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new();
    fetcher.serve(&url("/"), "<html>");
    fetcher.serve(&url("/a.json"), "[]");

    let first = disk_gateway(dir.path(), "quran-full-v4", fetcher.clone()).await;
    first.install().await.unwrap();
    first.activate().await.unwrap();
    drop(first);

    // A fresh process answers offline from what the first one stored
    fetcher.set_offline(true);
    let second = disk_gateway(dir.path(), "quran-full-v4", fetcher).await;
    match second.handle_fetch(&InterceptedRequest::get(url("/a.json"))).await {
        FetchOutcome::Respond { response, source } => {
            assert_eq!(source, ResponseSource::Cache);
            assert_eq!(&response.body[..], b"[]");
        }
        other => panic!("expected cached response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_version_bump_sweeps_previous_generation_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new();
    fetcher.serve(&url("/"), "<html>v3");
    fetcher.serve(&url("/a.json"), "[]");

    let old = disk_gateway(dir.path(), "quran-app-complete-v3", fetcher.clone()).await;
    old.install().await.unwrap();
    old.activate().await.unwrap();

    let new = disk_gateway(dir.path(), "quran-full-v4", fetcher).await;
    new.install().await.unwrap();
    let report = new.activate().await.unwrap();

    assert_eq!(report.deleted, vec!["quran-app-complete-v3"]);
    let storage = DiskCacheStorage::new(dir.path()).await.unwrap();
    assert_eq!(storage.keys().await.unwrap(), vec!["quran-full-v4"]);
    assert_eq!(storage.entries("quran-full-v4").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_open_storage_selects_backend() {
    let dir = tempfile::tempdir().unwrap();
    let disk = open_storage(&CacheStorageConfig {
        backend: "disk".to_string(),
        data_dir: dir.path().to_string_lossy().to_string(),
    })
    .await
    .unwrap();
    disk.open("v1").await.unwrap();
    assert!(dir.path().join("caches").join("v1").exists());

    let bad = open_storage(&CacheStorageConfig {
        backend: "sqlite".to_string(),
        data_dir: String::new(),
    })
    .await;
    assert!(bad.is_err());
}

#[test]
fn test_memory_backend_starts_empty() {
    let storage = tokio_test::block_on(open_storage(&CacheStorageConfig {
        backend: "memory".to_string(),
        data_dir: String::new(),
    }))
    .unwrap();
    assert!(tokio_test::block_on(storage.keys()).unwrap().is_empty());
    assert!(!tokio_test::block_on(storage.has("quran-full-v4")).unwrap());
}
