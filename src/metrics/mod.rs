// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    FETCH_OUTCOMES,
    REQUEST_DURATION,
    NETWORK_FETCHES,
    CACHE_OPERATIONS,
    LIFECYCLE_EVENTS,
    NOTIFICATIONS,
    SYNC_RUNS,
};

/// Helper to record proxy request metrics
pub fn record_request(method: &str, status_code: u16, duration_secs: f64) {
    REQUEST_DURATION
        .with_label_values(&[method, &status_code.to_string()])
        .observe(duration_secs);
}

pub fn record_fetch_outcome(outcome: &str) {
    FETCH_OUTCOMES.with_label_values(&[outcome]).inc();
}

/// Helper to record an upstream fetch; `None` means the fetch rejected
pub fn record_network_fetch(status: Option<u16>) {
    let class = match status {
        Some(s) => format!("{}xx", s / 100),
        None => "failed".to_string(),
    };
    NETWORK_FETCHES.with_label_values(&[&class]).inc();
}

/// Helpers to record cache operations
pub fn record_cache_hit() {
    CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_cache_write() {
    CACHE_OPERATIONS.with_label_values(&["write"]).inc();
}

pub fn record_cache_write_failed() {
    CACHE_OPERATIONS.with_label_values(&["write_failed"]).inc();
}

pub fn record_generations_deleted(count: usize) {
    if count > 0 {
        CACHE_OPERATIONS
            .with_label_values(&["generation_deleted"])
            .inc_by(count as f64);
    }
}

pub fn record_lifecycle(event: &str, success: bool) {
    let result = if success { "success" } else { "failure" };
    LIFECYCLE_EVENTS.with_label_values(&[event, result]).inc();
}

pub fn record_notification(event: &str) {
    NOTIFICATIONS.with_label_values(&[event]).inc();
}

pub fn record_sync(success: bool) {
    let result = if success { "success" } else { "failure" };
    SYNC_RUNS.with_label_values(&[result]).inc();
}
