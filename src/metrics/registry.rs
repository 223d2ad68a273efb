// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, HistogramVec, Opts, Registry, TextEncoder, Encoder,
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // REQUEST METRICS
    // ============================================================================

    /// Intercepted requests by how they were answered
    pub static ref FETCH_OUTCOMES: CounterVec = register_counter_vec_with_registry!(
        Opts::new("fetch_outcomes_total", "Intercepted requests by outcome"),
        &["outcome"], // outcome: cache, network, passthrough, fallback_html, fallback_json, no_response
        REGISTRY
    ).unwrap();

    /// Proxy request duration histogram
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("request_duration_seconds", "Request duration in seconds")
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "status_code"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // NETWORK METRICS
    // ============================================================================

    /// Upstream fetches by status class
    pub static ref NETWORK_FETCHES: CounterVec = register_counter_vec_with_registry!(
        Opts::new("network_fetches_total", "Upstream fetches"),
        &["status"], // status: 2xx, 3xx, 4xx, 5xx, failed
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE METRICS
    // ============================================================================

    /// Cache operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("cache_operations_total", "Total cache operations"),
        &["operation"], // operation: hit, miss, write, write_failed, generation_deleted
        REGISTRY
    ).unwrap();

    // ============================================================================
    // LIFECYCLE METRICS
    // ============================================================================

    /// Install and activate runs
    pub static ref LIFECYCLE_EVENTS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("lifecycle_events_total", "Install and activate runs"),
        &["event", "result"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // NOTIFICATION & SYNC METRICS
    // ============================================================================

    /// Notifications shown and clicked
    pub static ref NOTIFICATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("notifications_total", "Notifications shown and clicked"),
        &["event"], // event: shown, read, snooze, open
        REGISTRY
    ).unwrap();

    /// Background sync runs
    pub static ref SYNC_RUNS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("sync_runs_total", "Background sync runs"),
        &["result"],
        REGISTRY
    ).unwrap();
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
