// Request interception - cache first, network fallback
// Author: kelexine (https://github.com/kelexine)

use super::gateway::OfflineGateway;
use crate::metrics;
use crate::network::{GatewayResponse, InterceptedRequest, ResponseType};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

/// Where an intercepted request's answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    /// The cached root document, served for a failed HTML navigation.
    FallbackDocument,
    /// Synthetic JSON error body for a failed JSON request.
    OfflineJson,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
            ResponseSource::FallbackDocument => "fallback_html",
            ResponseSource::OfflineJson => "fallback_json",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Not intercepted; the request goes to the network untouched.
    PassThrough,
    Respond {
        response: GatewayResponse,
        source: ResponseSource,
    },
    /// Intercepted, but nothing can answer it.
    NoResponse,
}

impl OfflineGateway {
    /// Answer an outbound request, cache first.
    ///
    /// Only GET requests with a fetchable URL are intercepted. A cache hit is
    /// returned without touching the network. On a miss the network response
    /// is returned, and a `200` basic response is also written to the current
    /// generation in the background once that generation has installed. A
    /// generation still installing, or one whose install failed, is never
    /// written to. When the network rejects, HTML
    /// navigations get the fallback document and JSON requests an offline
    /// error body.
    pub async fn handle_fetch(&self, request: &InterceptedRequest) -> FetchOutcome {
        if !request.is_get() || !request.is_fetchable() {
            debug!("Passing through {} {}", request.method, request.url);
            metrics::record_fetch_outcome("passthrough");
            return FetchOutcome::PassThrough;
        }

        match self.cache().lookup(request).await {
            Ok(Some(response)) => {
                metrics::record_fetch_outcome(ResponseSource::Cache.as_str());
                return FetchOutcome::Respond {
                    response,
                    source: ResponseSource::Cache,
                };
            }
            Ok(None) => {}
            Err(e) => warn!("Cache lookup for {} failed, going to network: {}", request.url, e),
        }

        match self.fetcher().fetch(request).await {
            Ok(response) => {
                metrics::record_network_fetch(Some(response.status));
                if !response.is_cacheable() {
                    debug!(
                        "Not caching {} (status {}, type {:?})",
                        request.url, response.status, response.response_type
                    );
                } else if !self.accepts_writes() {
                    debug!(
                        "Not caching {}: generation {} is not installed",
                        request.url,
                        self.cache().current_generation()
                    );
                } else {
                    self.store_in_background(request.clone(), response.clone());
                }
                metrics::record_fetch_outcome(ResponseSource::Network.as_str());
                FetchOutcome::Respond {
                    response,
                    source: ResponseSource::Network,
                }
            }
            Err(e) => {
                metrics::record_network_fetch(None);
                debug!("Network failed for {}: {}", request.url, e);
                self.offline_fallback(request).await
            }
        }
    }

    fn store_in_background(&self, request: InterceptedRequest, response: GatewayResponse) {
        let cache = self.cache().clone();
        self.spawn_background(async move {
            if let Err(e) = cache.store(&request, response).await {
                warn!("Background cache write for {} failed: {}", request.url, e);
                metrics::record_cache_write_failed();
            }
        });
    }

    async fn offline_fallback(&self, request: &InterceptedRequest) -> FetchOutcome {
        if request.accepts_html() {
            let fallback = match self.resolve(&self.config().fallback_document) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Fallback document is unusable: {}", e);
                    metrics::record_fetch_outcome("no_response");
                    return FetchOutcome::NoResponse;
                }
            };
            return match self.cache().lookup_url(&fallback).await {
                Ok(Some(response)) => {
                    metrics::record_fetch_outcome(ResponseSource::FallbackDocument.as_str());
                    FetchOutcome::Respond {
                        response,
                        source: ResponseSource::FallbackDocument,
                    }
                }
                Ok(None) => {
                    warn!("Offline and fallback document {} is not cached", fallback);
                    metrics::record_fetch_outcome("no_response");
                    FetchOutcome::NoResponse
                }
                Err(e) => {
                    warn!("Fallback lookup failed: {}", e);
                    metrics::record_fetch_outcome("no_response");
                    FetchOutcome::NoResponse
                }
            };
        }

        if request.targets_json() {
            let body = json!({
                "error": self.inner.notifications.offline_message,
                "offline": true,
            });
            let response = GatewayResponse::ok(&request.url, body.to_string())
                .with_header("content-type", "application/json")
                .with_type(ResponseType::Basic);
            metrics::record_fetch_outcome(ResponseSource::OfflineJson.as_str());
            return FetchOutcome::Respond {
                response,
                source: ResponseSource::OfflineJson,
            };
        }

        metrics::record_fetch_outcome("no_response");
        FetchOutcome::NoResponse
    }
}
