//! Axum-based HTTP proxy hosting the offline gateway.
//!
//! Application requests are routed through the gateway's cache-first
//! interception; the `/_gateway/*` endpoints expose health, metrics, window
//! client registration and the push, click, message and sync triggers.
//!
//! # Components
//!
//! - `clients`: [`LocalHost`], window clients connected over SSE.
//! - `handlers`: Implementation of individual endpoints.
//! - `middleware`: Request ID tracking.
//! - `routes`: The main router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod clients;
mod handlers;
mod middleware;
mod routes;

pub use clients::LocalHost;
pub use handlers::SOURCE_HEADER;
pub use routes::{create_router, AppState};
