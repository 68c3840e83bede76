//! Prometheus Metrics Module
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - Active relay connections and rooms
//! - Relay events handled, by event kind
//! - Message persistence outcomes and latency

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "chat_relay";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter by method, matched path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// Open relay connections (authenticated sessions)
pub static RELAY_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("relay_connections_active", "Number of open relay connections")
            .namespace(NAMESPACE),
    )
    .expect("Failed to create RELAY_CONNECTIONS_ACTIVE metric")
});

/// Rooms with at least one member
pub static RELAY_ROOMS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("relay_rooms_active", "Number of rooms with at least one member")
            .namespace(NAMESPACE),
    )
    .expect("Failed to create RELAY_ROOMS_ACTIVE metric")
});

/// Inbound relay events by kind
pub static RELAY_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relay_events_total", "Inbound relay events handled").namespace(NAMESPACE),
        &["event"],
    )
    .expect("Failed to create RELAY_EVENTS_TOTAL metric")
});

/// Relay handshake rejections by error kind
pub static RELAY_HANDSHAKE_REJECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relay_handshake_rejected_total", "Rejected relay handshakes")
            .namespace(NAMESPACE),
        &["kind"],
    )
    .expect("Failed to create RELAY_HANDSHAKE_REJECTED_TOTAL metric")
});

/// Message saves from the relay by outcome ("ok", "failed", "timeout")
pub static MESSAGE_PERSIST_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("message_persist_total", "Relay message saves by outcome").namespace(NAMESPACE),
        &["outcome"],
    )
    .expect("Failed to create MESSAGE_PERSIST_TOTAL metric")
});

/// Message save latency in seconds
pub static MESSAGE_PERSIST_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("message_persist_seconds", "Relay message save latency")
            .namespace(NAMESPACE)
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
    )
    .expect("Failed to create MESSAGE_PERSIST_SECONDS metric")
});

fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(RELAY_CONNECTIONS_ACTIVE.clone()),
        Box::new(RELAY_ROOMS_ACTIVE.clone()),
        Box::new(RELAY_EVENTS_TOTAL.clone()),
        Box::new(RELAY_HANDSHAKE_REJECTED_TOTAL.clone()),
        Box::new(MESSAGE_PERSIST_TOTAL.clone()),
        Box::new(MESSAGE_PERSIST_SECONDS.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            tracing::warn!(error = %e, "Failed to register metric");
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
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record one HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
}

/// Update relay gauges
pub fn set_relay_gauges(connections: usize, rooms: usize) {
    RELAY_CONNECTIONS_ACTIVE.set(connections as i64);
    RELAY_ROOMS_ACTIVE.set(rooms as i64);
}

pub fn record_relay_event(event: &str) {
    RELAY_EVENTS_TOTAL.with_label_values(&[event]).inc();
}

pub fn record_handshake_rejected(kind: &str) {
    RELAY_HANDSHAKE_REJECTED_TOTAL
        .with_label_values(&[kind])
        .inc();
}

pub fn record_message_persist(outcome: &str, duration_secs: f64) {
    MESSAGE_PERSIST_TOTAL.with_label_values(&[outcome]).inc();
    MESSAGE_PERSIST_SECONDS.observe(duration_secs);
}
