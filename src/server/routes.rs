// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::clients::LocalHost;
use super::handlers::{
    clients_handler, health_handler, message_handler, metrics_handler,
    notification_click_handler, proxy_handler, push_handler, sync_handler,
};
use super::middleware::request_id_layers;
use crate::config::AppConfig;
use crate::error::Result;
use crate::worker::OfflineGateway;
use axum::{routing::{get, post}, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub gateway: OfflineGateway,
    pub host: Arc<LocalHost>,
}

pub fn create_router(
    config: AppConfig,
    gateway: OfflineGateway,
    host: Arc<LocalHost>,
) -> Result<Router> {
    let max_body_bytes = config.performance.max_body_bytes;
    let enable_compression = config.performance.enable_compression;
    let state = AppState {
        config,
        gateway,
        host,
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let gateway_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/clients", get(clients_handler))
        .route("/push", post(push_handler))
        .route("/notifications/click", post(notification_click_handler))
        .route("/message", post(message_handler))
        .route("/sync", post(sync_handler));

    let mut app = Router::new()
        .nest("/_gateway", gateway_routes)
        // Everything else is an intercepted application request
        .fallback(proxy_handler)
        .layer(tower_http::limit::RequestBodyLimitLayer::new(max_body_bytes));

    if enable_compression {
        app = app.layer(CompressionLayer::new());
    }

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
