// Shared test doubles for the gateway integration tests
// Author: kelexine (https://github.com/kelexine)

#![allow(dead_code)]

use async_trait::async_trait;
use offline_gateway::cache::{CacheStorage, MemoryCacheStorage};
use offline_gateway::config::GatewayConfig;
use offline_gateway::error::{GatewayError, Result};
use offline_gateway::network::{Fetcher, GatewayResponse, InterceptedRequest, ResponseType};
use offline_gateway::worker::{ClientMessage, Host, NotificationRequest, OfflineGateway, WindowClient};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const ORIGIN: &str = "https://quran.test";

pub fn url(path: &str) -> String {
    format!("{}{}", ORIGIN, path)
}

/// Fetcher answering from a fixed route table and counting calls.
#[derive(Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, Option<GatewayResponse>>>,
    calls: Mutex<HashMap<String, usize>>,
    offline: AtomicBool,
}

impl MockFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serve `body` as a basic 200 at `url`.
    pub fn serve(&self, url: &str, body: &'static str) -> &Self {
        self.respond(url, GatewayResponse::ok(url, body))
    }

    pub fn respond(&self, url: &str, response: GatewayResponse) -> &Self {
        self.routes.lock().insert(url.to_string(), Some(response));
        self
    }

    /// Make fetches of `url` reject as if the network were down.
    pub fn fail(&self, url: &str) -> &Self {
        self.routes.lock().insert(url.to_string(), None);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<GatewayResponse> {
        *self.calls.lock().entry(request.url.clone()).or_insert(0) += 1;
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("offline".into()));
        }
        let route = self.routes.lock().get(&request.url).cloned();
        match route {
            Some(Some(response)) => Ok(response),
            Some(None) => Err(GatewayError::Network(format!("{} unreachable", request.url))),
            None => Ok(GatewayResponse::ok(&request.url, "")
                .with_status(404, "Not Found")
                .with_type(ResponseType::Basic)),
        }
    }
}

/// Everything a gateway asked its host to do.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Shown { title: String, notification: NotificationRequest },
    Closed(String),
    Focused(String),
    Opened(String),
    Posted { client_id: String, message: ClientMessage },
    Claimed(String),
    SkipWaiting,
}

#[derive(Default)]
pub struct RecordingHost {
    windows: Mutex<Vec<WindowClient>>,
    calls: Mutex<Vec<HostCall>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_window(&self, id: &str, url: &str) {
        self.windows.lock().push(WindowClient {
            id: id.to_string(),
            url: url.to_string(),
            focused: false,
        });
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn show_notification(&self, title: &str, notification: &NotificationRequest) -> Result<()> {
        self.record(HostCall::Shown {
            title: title.to_string(),
            notification: notification.clone(),
        });
        Ok(())
    }

    async fn close_notification(&self, tag: &str) -> Result<()> {
        self.record(HostCall::Closed(tag.to_string()));
        Ok(())
    }

    async fn match_windows(&self) -> Result<Vec<WindowClient>> {
        Ok(self.windows.lock().clone())
    }

    async fn focus(&self, client_id: &str) -> Result<()> {
        self.record(HostCall::Focused(client_id.to_string()));
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<()> {
        self.record(HostCall::Opened(url.to_string()));
        Ok(())
    }

    async fn post_message(&self, client_id: &str, message: &ClientMessage) -> Result<()> {
        self.record(HostCall::Posted {
            client_id: client_id.to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn claim(&self, generation: &str) -> Result<usize> {
        self.record(HostCall::Claimed(generation.to_string()));
        Ok(self.windows.lock().len())
    }

    async fn skip_waiting(&self) -> Result<()> {
        self.record(HostCall::SkipWaiting);
        Ok(())
    }
}

pub fn gateway_config(cache_name: &str, manifest: &[&str]) -> GatewayConfig {
    GatewayConfig {
        origin: ORIGIN.to_string(),
        cache_name: cache_name.to_string(),
        manifest: manifest.iter().map(|s| s.to_string()).collect(),
        ..GatewayConfig::default()
    }
}

pub struct Harness {
    pub gateway: OfflineGateway,
    pub fetcher: Arc<MockFetcher>,
    pub host: Arc<RecordingHost>,
    pub storage: Arc<MemoryCacheStorage>,
}

pub fn harness(cache_name: &str, manifest: &[&str]) -> Harness {
    harness_with_storage(cache_name, manifest, Arc::new(MemoryCacheStorage::new()))
}

pub fn harness_with_storage(
    cache_name: &str,
    manifest: &[&str],
    storage: Arc<MemoryCacheStorage>,
) -> Harness {
    let fetcher = MockFetcher::new();
    let host = RecordingHost::new();
    let gateway = OfflineGateway::builder(gateway_config(cache_name, manifest))
        .storage(storage.clone() as Arc<dyn CacheStorage>)
        .fetcher(fetcher.clone())
        .host(host.clone())
        .build()
        .unwrap();
    Harness {
        gateway,
        fetcher,
        host,
        storage,
    }
}
