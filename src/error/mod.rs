// Error types for the offline gateway
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Install failed: {0}")]
    Install(String),

    #[error("Invalid worker state: {0}")]
    InvalidState(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Cache storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Offline: {0}")]
    Offline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Convert GatewayError to HTTP responses for Axum
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            GatewayError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", self.to_string())
            }
            GatewayError::InvalidState(_) => {
                (StatusCode::CONFLICT, "invalid_state_error", self.to_string())
            }
            GatewayError::Offline(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "offline_error", self.to_string())
            }
            GatewayError::Network(_) | GatewayError::Http(_) => {
                (StatusCode::BAD_GATEWAY, "network_error", self.to_string())
            }
            GatewayError::Install(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "install_error", self.to_string())
            }
            GatewayError::Config(_) | GatewayError::ConfigParsing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", self.to_string())
            }
            GatewayError::Storage(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", self.to_string())
            }
            _ => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", self.to_string())
            }
        };

        let body = json!({
            "type": "error",
            "error": {
                "type": error_type,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
