//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Authentication outcomes (login, registration, logout)
//! - Social edge toggles by kind and resulting state
//! - Database connection pool gauges

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::domain::{EdgeKind, EdgeState};

const NAMESPACE: &str = "chirp_server";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Authentication events by kind and outcome
pub static AUTH_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("auth_events_total", "Authentication attempts by outcome").namespace(NAMESPACE),
        &["event", "outcome"], // event: "login" | "register" | "logout"
    )
    .expect("Failed to create AUTH_EVENTS_TOTAL metric")
});

/// Social edge toggles by edge kind and resulting state
pub static SOCIAL_TOGGLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("social_toggles_total", "Follow/like/retweet toggles").namespace(NAMESPACE),
        &["kind", "state"],
    )
    .expect("Failed to create SOCIAL_TOGGLES_TOTAL metric")
});

/// Database connection pool stats
pub static DB_POOL_CONNECTIONS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("db_pool_connections", "Database connection pool statistics")
            .namespace(NAMESPACE),
        &["state"], // "idle", "active", "max"
    )
    .expect("Failed to create DB_POOL_CONNECTIONS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    let collectors: Vec<(&str, Box<dyn prometheus::core::Collector>)> = vec![
        ("HTTP_REQUESTS_TOTAL", Box::new(HTTP_REQUESTS_TOTAL.clone())),
        (
            "HTTP_REQUEST_DURATION_SECONDS",
            Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        ),
        ("AUTH_EVENTS_TOTAL", Box::new(AUTH_EVENTS_TOTAL.clone())),
        ("SOCIAL_TOGGLES_TOTAL", Box::new(SOCIAL_TOGGLES_TOTAL.clone())),
        ("DB_POOL_CONNECTIONS", Box::new(DB_POOL_CONNECTIONS.clone())),
    ];

    for (name, collector) in collectors {
        if let Err(e) = registry.register(collector) {
            tracing::error!(metric = name, error = %e, "Failed to register metric");
        }
    }
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to record a login/registration/logout outcome
pub fn record_auth_event(event: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    AUTH_EVENTS_TOTAL.with_label_values(&[event, outcome]).inc();
}

/// Helper to record a toggle result
pub fn record_toggle(kind: EdgeKind, state: EdgeState) {
    SOCIAL_TOGGLES_TOTAL
        .with_label_values(&[kind.as_str(), state.as_str()])
        .inc();
}

/// Helper to update database pool stats
pub fn update_db_pool_stats(idle: u32, active: u32, max: u32) {
    DB_POOL_CONNECTIONS
        .with_label_values(&["idle"])
        .set(idle as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["active"])
        .set(active as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["max"])
        .set(max as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_includes_recorded_metrics() {
        record_http_request("GET", "/api/tweets", 200, 0.01);
        record_auth_event("login", true);
        record_toggle(EdgeKind::Like, EdgeState::Present);

        let output = gather_metrics();

        assert!(output.contains("chirp_server_http_requests_total"));
        assert!(output.contains("chirp_server_auth_events_total"));
        assert!(output.contains(r#"kind="like""#));
    }
}
