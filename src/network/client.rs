// Network fetcher backed by reqwest
// Author: kelexine (https://github.com/kelexine)

use super::models::{GatewayResponse, InterceptedRequest, ResponseType};
use crate::config::PerformanceConfig;
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use std::time::Duration;
use tracing::debug;

/// Headers that describe a single hop and must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// The network side of the gateway.
///
/// A rejected future means the request never produced a response
/// (offline, DNS failure, refused connection); HTTP error statuses are
/// successful fetches.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<GatewayResponse>;
}

/// Fetcher performing real HTTP requests.
///
/// Responses are classified against the application origin: same-origin and
/// not redirected is `basic`, cross-origin is `cors`, and a same-origin
/// response reached through a redirect is reported as `opaque`.
pub struct HttpFetcher {
    http_client: Client,
    origin: Url,
}

impl HttpFetcher {
    pub fn new(origin: &str, config: &PerformanceConfig) -> Result<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| GatewayError::Config(format!("Invalid origin {}: {}", origin, e)))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .pool_max_idle_per_host(config.connection_pool_size)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| GatewayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created HTTP fetcher for origin {}", origin);

        Ok(Self { http_client, origin })
    }

    fn classify(&self, requested: &Url, final_url: &Url) -> (ResponseType, bool) {
        let redirected = requested != final_url;
        if final_url.origin() != self.origin.origin() {
            (ResponseType::Cors, redirected)
        } else if redirected {
            (ResponseType::Opaque, redirected)
        } else {
            (ResponseType::Basic, redirected)
        }
    }

    fn forwarded_headers(request: &InterceptedRequest) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            if HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h)) {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        headers
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<GatewayResponse> {
        let url = Url::parse(&request.url)
            .map_err(|e| GatewayError::InvalidRequest(format!("Invalid URL {}: {}", request.url, e)))?;
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| GatewayError::InvalidRequest(format!("Invalid method: {}", e)))?;

        debug!("Fetching {} {}", method, url);

        let mut builder = self
            .http_client
            .request(method, url.clone())
            .headers(Self::forwarded_headers(request));
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("{} {}: {}", request.method, request.url, e)))?;

        let status = response.status();
        let (response_type, redirected) = self.classify(&url, response.url());
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to read body of {}: {}", final_url, e)))?;

        Ok(GatewayResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
            response_type,
            url: final_url,
            redirected,
        })
    }
}
