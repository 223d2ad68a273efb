//! Configuration data structures for the offline gateway.
//!
//! This module defines the schema for the application settings: the proxy
//! listener, the cache generation and its asset manifest, notification
//! presentation, logging and HTTP client tuning.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, workers).
    #[serde(default)]
    pub server: ServerConfig,

    /// Cache generation, manifest and application origin.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Where cache generations are persisted.
    #[serde(default)]
    pub cache: CacheStorageConfig,

    /// Notification presentation.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Performance and resource management settings.
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8080`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads for the tokio runtime.
    /// Default: Number of logical CPU cores.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Settings describing the current cache generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Origin of the application being served (scheme, host and port).
    /// Relative manifest entries and origin-form requests resolve against it.
    /// Default: `http://127.0.0.1:3000`
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version string naming the current cache generation.
    /// Default: `quran-app-complete-v3`
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Application version reported by the health endpoint.
    /// Default: `3.0.0`
    #[serde(default = "default_app_version")]
    pub app_version: String,

    /// Assets that must be cached before the generation may activate.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Document served when an HTML navigation fails offline.
    /// Default: `/index.html`
    #[serde(default = "default_fallback_document")]
    pub fallback_document: String,

    /// Path prefix that window clients must match to be focused.
    /// Default: `/`
    #[serde(default = "default_scope")]
    pub scope: String,
}

/// Backend selection for cache generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStorageConfig {
    /// `disk` or `memory`.
    /// Default: `disk`
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Root directory for the disk backend.
    /// Default: `~/.offline-gateway`
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

/// Notification presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_title")]
    pub title: String,

    /// Body used when a push arrives without a usable payload.
    #[serde(default = "default_body")]
    pub default_body: String,

    /// Error message in the synthetic offline JSON response.
    #[serde(default = "default_offline_message")]
    pub offline_message: String,

    #[serde(default = "default_icon")]
    pub icon: String,

    #[serde(default = "default_badge")]
    pub badge: String,

    /// Replacement tag; a new notification with the same tag replaces the old one.
    #[serde(default = "default_tag")]
    pub tag: String,

    #[serde(default = "default_vibrate")]
    pub vibrate: Vec<u32>,

    #[serde(default = "default_read_title")]
    pub read_action_title: String,

    #[serde(default = "default_snooze_title")]
    pub snooze_action_title: String,

    /// Launch the system browser when a window has to be opened.
    /// Default: `false`
    #[serde(default)]
    pub launch_browser: bool,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Settings for tuning application performance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Upstream request timeout in seconds.
    /// Default: `30`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Upstream connect timeout in seconds.
    /// Default: `10`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Maximum number of idle connections to keep per upstream host.
    /// Default: `10`
    #[serde(default = "default_pool_size")]
    pub connection_pool_size: usize,

    /// Whether to enable gzip compression for proxy responses.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enable_compression: bool,

    /// Largest request body accepted by the proxy, in bytes.
    /// Default: 10 MiB
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_name: default_cache_name(),
            app_version: default_app_version(),
            manifest: default_manifest(),
            fallback_document: default_fallback_document(),
            scope: default_scope(),
        }
    }
}

impl Default for CacheStorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            default_body: default_body(),
            offline_message: default_offline_message(),
            icon: default_icon(),
            badge: default_badge(),
            tag: default_tag(),
            vibrate: default_vibrate(),
            read_action_title: default_read_title(),
            snooze_action_title: default_snooze_title(),
            launch_browser: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            connection_pool_size: default_pool_size(),
            enable_compression: true,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_origin() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_cache_name() -> String {
    "quran-app-complete-v3".to_string()
}

fn default_app_version() -> String {
    "3.0.0".to_string()
}

fn default_manifest() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/manifest.json",
        "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css",
        "https://fonts.googleapis.com/css2?family=Amiri+Quran&family=Noto+Naskh+Arabic&family=Tajawal&display=swap",
        "https://img.icons8.com/color/96/000000/quran.png",
        "https://img.icons8.com/color/144/000000/quran.png",
        "https://img.icons8.com/color/192/000000/quran.png",
        "https://img.icons8.com/color/512/000000/quran.png",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_fallback_document() -> String {
    "/index.html".to_string()
}

fn default_scope() -> String {
    "/".to_string()
}

fn default_backend() -> String {
    "disk".to_string()
}

fn default_data_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".offline-gateway")
        .to_string_lossy()
        .to_string()
}

fn default_title() -> String {
    "The Holy Quran".to_string()
}

fn default_body() -> String {
    "🕌 It is time to read the Holy Quran".to_string()
}

fn default_offline_message() -> String {
    "No internet connection".to_string()
}

fn default_icon() -> String {
    "https://img.icons8.com/color/192/000000/quran.png".to_string()
}

fn default_badge() -> String {
    "https://img.icons8.com/color/96/000000/quran.png".to_string()
}

fn default_tag() -> String {
    "quran-reminder".to_string()
}

fn default_vibrate() -> Vec<u32> {
    vec![100, 50, 100]
}

fn default_read_title() -> String {
    "📖 Read now".to_string()
}

fn default_snooze_title() -> String {
    "⏰ Later".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_pool_size() -> usize {
    10
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}
