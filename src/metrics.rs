//! Prometheus metrics for status requests and flag updates.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

use crate::status::StatusKind;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Status page requests counter metric name.
pub const METRIC_STATUS_REQUESTS: &str = "status_requests_total";
/// Applied flag updates counter metric name.
pub const METRIC_FLAG_UPDATES: &str = "flag_updates_total";
/// Rejected update requests counter metric name.
pub const METRIC_UPDATE_REJECTIONS: &str = "update_rejections_total";

/// Initialize all metric descriptions.
/// Call this once at startup, after the recorder is installed.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    describe_counter!(
        METRIC_STATUS_REQUESTS,
        "Total number of status page requests, by reported status"
    );
    describe_counter!(
        METRIC_FLAG_UPDATES,
        "Total number of applied cancellation flag updates"
    );
    describe_counter!(
        METRIC_UPDATE_REJECTIONS,
        "Total number of rejected update requests"
    );

    debug!("Metrics initialized");
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint).record(latency_ms);
}

/// Increment status requests counter.
pub fn inc_status_requests(kind: StatusKind) {
    let status: &'static str = kind.into();
    counter!(METRIC_STATUS_REQUESTS, "status" => status).increment(1);
}

/// Increment flag updates counter. `mode` is `set` or `toggle`.
pub fn inc_flag_updates(mode: &'static str) {
    counter!(METRIC_FLAG_UPDATES, "mode" => mode).increment(1);
}

/// Increment update rejections counter.
pub fn inc_update_rejections(reason: &'static str) {
    counter!(METRIC_UPDATE_REJECTIONS, "reason" => reason).increment(1);
}
