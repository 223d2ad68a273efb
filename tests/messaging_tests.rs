// Control message, background sync and event bus tests
// Author: kelexine (https://github.com/kelexine)

mod common;

use async_trait::async_trait;
use common::{gateway_config, url, HostCall, MockFetcher, RecordingHost};
use offline_gateway::cache::MemoryCacheStorage;
use offline_gateway::error::{GatewayError, Result};
use offline_gateway::network::InterceptedRequest;
use offline_gateway::worker::{
    ClientMessage, EventOutcome, FetchOutcome, MessageOutcome, OfflineGateway, SyncOutcome,
    SyncTask, WorkerEvent, WorkerState,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingSync(AtomicUsize);

#[async_trait]
impl SyncTask for CountingSync {
    async fn run(&self) -> Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingSync;

#[async_trait]
impl SyncTask for FailingSync {
    async fn run(&self) -> Result<()> {
        Err(GatewayError::Network("progress server unreachable".into()))
    }
}

fn gateway(sync: Arc<dyn SyncTask>) -> (OfflineGateway, Arc<RecordingHost>, Arc<MockFetcher>) {
    let host = RecordingHost::new();
    let fetcher = MockFetcher::new();
    let gateway = OfflineGateway::builder(gateway_config("v1", &["/"]))
        .storage(Arc::new(MemoryCacheStorage::new()))
        .fetcher(fetcher.clone())
        .host(host.clone())
        .sync_task(sync)
        .build()
        .unwrap();
    (gateway, host, fetcher)
}

#[tokio::test]
async fn test_skip_waiting_message() {
    let (gateway, host, _) = gateway(Arc::new(CountingSync(AtomicUsize::new(0))));

    let outcome = gateway.handle_message(&json!({"type": "SKIP_WAITING"})).await;

    assert_eq!(outcome, MessageOutcome::SkipWaiting);
    assert!(gateway.skip_waiting_requested());
    assert_eq!(host.calls(), vec![HostCall::SkipWaiting]);
}

#[tokio::test]
async fn test_other_messages_are_ignored() {
    let (gateway, host, _) = gateway(Arc::new(CountingSync(AtomicUsize::new(0))));

    for message in [json!({"type": "REFRESH"}), json!("SKIP_WAITING"), json!(null)] {
        assert_eq!(gateway.handle_message(&message).await, MessageOutcome::Ignored);
    }
    assert!(!gateway.skip_waiting_requested());
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn test_sync_broadcasts_completion() {
    let sync = Arc::new(CountingSync(AtomicUsize::new(0)));
    let (gateway, host, _) = gateway(sync.clone());
    host.add_window("tab-1", &url("/"));
    host.add_window("tab-2", &url("/surah/2"));

    let outcome = gateway.handle_sync("sync-data").await;

    assert_eq!(outcome, SyncOutcome::Completed { notified: 2 });
    assert_eq!(sync.0.load(Ordering::SeqCst), 1);
    let posted: Vec<_> = host
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            HostCall::Posted { client_id, message } => Some((client_id, message)),
            _ => None,
        })
        .collect();
    assert_eq!(posted.len(), 2);
    assert!(posted
        .iter()
        .all(|(_, m)| matches!(m, ClientMessage::SyncComplete { timestamp } if *timestamp > 0)));
}

#[tokio::test]
async fn test_sync_failure_is_contained() {
    let (gateway, host, _) = gateway(Arc::new(FailingSync));
    host.add_window("tab-1", &url("/"));

    let outcome = gateway.handle_sync("sync-data").await;

    assert!(matches!(outcome, SyncOutcome::Failed { .. }));
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_sync_tag_is_ignored() {
    let sync = Arc::new(CountingSync(AtomicUsize::new(0)));
    let (gateway, _, _) = gateway(sync.clone());
    assert_eq!(gateway.handle_sync("sync-bookmarks").await, SyncOutcome::Ignored);
    assert_eq!(sync.0.load(Ordering::SeqCst), 0);
}

#[test]
fn test_sync_complete_wire_format() {
    let encoded = serde_json::to_value(ClientMessage::SyncComplete { timestamp: 42 }).unwrap();
    assert_eq!(encoded, json!({"type": "SYNC_COMPLETE", "timestamp": 42}));
}

#[tokio::test]
async fn test_event_bus_drives_full_lifecycle() {
    let (gateway, _, fetcher) = gateway(Arc::new(CountingSync(AtomicUsize::new(0))));
    fetcher.serve(&url("/"), "<html>");

    let installed = gateway.dispatch(WorkerEvent::Install).await.unwrap();
    assert!(matches!(installed, EventOutcome::Installed(ref r) if r.cached == 1));

    let activated = gateway.dispatch(WorkerEvent::Activate).await.unwrap();
    assert!(matches!(activated, EventOutcome::Activated(_)));
    assert_eq!(gateway.state(), WorkerState::Activated);

    let fetched = gateway
        .dispatch(WorkerEvent::Fetch(InterceptedRequest::get(url("/"))))
        .await
        .unwrap();
    assert!(matches!(fetched, EventOutcome::Fetched(FetchOutcome::Respond { .. })));

    let pushed = gateway.dispatch(WorkerEvent::Push(None)).await.unwrap();
    assert!(matches!(pushed, EventOutcome::Notified(_)));

    let synced = gateway
        .dispatch(WorkerEvent::Sync("sync-data".to_string()))
        .await
        .unwrap();
    assert_eq!(synced, EventOutcome::Synced(SyncOutcome::Completed { notified: 0 }));
}

#[tokio::test]
async fn test_skip_waiting_activates_installed_generation() {
    let (gateway, host, fetcher) = gateway(Arc::new(CountingSync(AtomicUsize::new(0))));
    fetcher.serve(&url("/"), "<html>");
    gateway.install().await.unwrap();
    assert_eq!(gateway.state(), WorkerState::Installed);

    let outcome = gateway.handle_message(&json!({"type": "SKIP_WAITING"})).await;

    assert_eq!(outcome, MessageOutcome::SkipWaiting);
    assert_eq!(gateway.state(), WorkerState::Activated);
    assert!(host.calls().contains(&HostCall::Claimed("v1".to_string())));
}
