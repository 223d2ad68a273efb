// Network module
// Author: kelexine (https://github.com/kelexine)

pub mod client;
pub mod models;

pub use client::{Fetcher, HttpFetcher};
pub use models::{GatewayResponse, InterceptedRequest, ResponseType};
