// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::error::GatewayError;
use crate::metrics;
use crate::network::{GatewayResponse, InterceptedRequest};
use crate::worker::{
    ClickOutcome, FetchOutcome, MessageOutcome, NotificationClick, NotificationRequest, SyncOutcome,
};
use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Header telling the page where a proxied response came from.
pub const SOURCE_HEADER: &str = "x-gateway-source";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let status = state.gateway.status();
    let mut overall_status = HealthStatus::Healthy;

    // Worker lifecycle
    let worker_check = match status.state {
        crate::worker::WorkerState::Activated => HealthCheck {
            status: "ok".to_string(),
            message: format!("Generation {} active", status.generation),
        },
        crate::worker::WorkerState::Redundant => {
            overall_status = HealthStatus::Degraded;
            HealthCheck {
                status: "warning".to_string(),
                message: format!("Install of {} failed; serving older caches", status.generation),
            }
        }
        other => {
            overall_status = HealthStatus::Degraded;
            HealthCheck {
                status: "warning".to_string(),
                message: format!(
                    "Generation {} is {:?} (skip waiting: {})",
                    status.generation, other, status.skip_waiting
                ),
            }
        }
    };
    checks.insert("worker".to_string(), worker_check);

    // Cache storage
    let cache_check = match state.gateway.cache().current_entry_count().await {
        Ok(count) => HealthCheck {
            status: "ok".to_string(),
            message: format!("{} entries in {}", count, status.generation),
        },
        Err(e) => {
            overall_status = HealthStatus::Unhealthy;
            HealthCheck {
                status: "error".to_string(),
                message: e.to_string(),
            }
        }
    };
    checks.insert("cache".to_string(), cache_check);

    checks.insert(
        "version".to_string(),
        HealthCheck {
            status: "ok".to_string(),
            message: format!("App version {}", status.app_version),
        },
    );

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [("content-type", "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

/// Every request not aimed at the gateway's own endpoints.
pub async fn proxy_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, GatewayError> {
    let started = Instant::now();
    let method = request.method().to_string();
    let intercepted = to_intercepted(&state, request).await?;

    let response = match state.gateway.handle_fetch(&intercepted).await {
        FetchOutcome::Respond { response, source } => {
            debug!("{} {} answered from {}", method, intercepted.url, source.as_str());
            into_http_response(response, source.as_str())
        }
        FetchOutcome::PassThrough => match state.gateway.fetcher().fetch(&intercepted).await {
            Ok(response) => into_http_response(response, "passthrough"),
            Err(e) => {
                warn!("Pass-through {} {} failed: {}", method, intercepted.url, e);
                GatewayError::Network(e.to_string()).into_response()
            }
        },
        FetchOutcome::NoResponse => {
            GatewayError::Offline(format!("no response available for {}", intercepted.url))
                .into_response()
        }
    };

    metrics::record_request(
        &method,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    Ok(response)
}

async fn to_intercepted(state: &AppState, request: Request) -> Result<InterceptedRequest, GatewayError> {
    let (parts, body) = request.into_parts();

    // Absolute-form targets are forward-proxy requests; origin-form ones belong to the app
    let url = if parts.uri.authority().is_some() {
        parts.uri.to_string()
    } else {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        state.gateway.resolve(path)?
    };

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let body = axum::body::to_bytes(body, state.config.performance.max_body_bytes)
        .await
        .map_err(|e| GatewayError::InvalidRequest(format!("Failed to read body: {}", e)))?;

    Ok(InterceptedRequest {
        method: parts.method.to_string(),
        url,
        headers,
        body,
    })
}

fn into_http_response(response: GatewayResponse, source: &str) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut http = Response::new(Body::from(response.body));
    *http.status_mut() = status;

    let headers = http.headers_mut();
    for (name, value) in &response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.append(name, value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(source) {
        headers.insert(SOURCE_HEADER, value);
    }
    http
}

pub async fn push_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<NotificationRequest>, GatewayError> {
    let payload = if body.is_empty() { None } else { Some(&body[..]) };
    Ok(Json(state.gateway.handle_push(payload).await?))
}

pub async fn notification_click_handler(
    State(state): State<AppState>,
    Json(click): Json<NotificationClick>,
) -> Result<Json<ClickOutcome>, GatewayError> {
    Ok(Json(state.gateway.handle_notification_click(&click).await?))
}

pub async fn message_handler(
    State(state): State<AppState>,
    Json(message): Json<Value>,
) -> Json<MessageOutcome> {
    Json(state.gateway.handle_message(&message).await)
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub tag: String,
}

pub async fn sync_handler(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Json<SyncOutcome> {
    Json(state.gateway.handle_sync(&request.tag).await)
}

#[derive(Debug, Deserialize)]
pub struct ClientQuery {
    #[serde(default)]
    pub url: Option<String>,
}

/// Removes the client when its SSE stream is dropped.
struct Registered {
    host: Arc<super::LocalHost>,
    client_id: String,
}

impl Drop for Registered {
    fn drop(&mut self) {
        self.host.unregister(&self.client_id);
    }
}

/// Server-sent event stream registering the caller as a window client.
pub async fn clients_handler(
    State(state): State<AppState>,
    Query(query): Query<ClientQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (client, mut rx) = state.host.register(query.url.as_deref().unwrap_or("/"));
    let guard = Registered {
        host: state.host.clone(),
        client_id: client.id.clone(),
    };

    let stream = async_stream::stream! {
        let _guard = guard;
        let hello = serde_json::to_string(&client).unwrap_or_default();
        yield Ok(Event::default().event("registered").data(hello));

        while let Some(message) = rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(data) => yield Ok(Event::default().event("message").data(data)),
                Err(e) => warn!("Failed to encode client message: {}", e),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
