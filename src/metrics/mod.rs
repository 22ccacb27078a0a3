//! Prometheus metrics for the relay service.
//!
//! - Relay metrics (accepted, rejected, provider failures)
//! - Provider call metrics (latency by outcome)
//! - WebSocket connection metrics
//! - Broadcast delivery metrics

mod helpers;

pub use helpers::{encode_metrics, BroadcastMetrics, ProviderMetrics, RelayMetrics, WsMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "relay";

lazy_static! {
    // ============================================================================
    // Relay Metrics
    // ============================================================================

    /// Relay requests by outcome (sent, rejected, provider_failed)
    pub static ref RELAY_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_requests_total", METRIC_PREFIX),
        "Total notification relay requests by outcome",
        &["outcome"]
    ).unwrap();

    // ============================================================================
    // Provider Metrics
    // ============================================================================

    /// Push provider call latency by result
    pub static ref PROVIDER_CALL_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_provider_call_latency_seconds", METRIC_PREFIX),
        "Push provider call latency in seconds",
        &["result"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // ============================================================================
    // WebSocket Metrics
    // ============================================================================

    /// Currently connected subscribers
    pub static ref WS_CONNECTIONS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_ws_connections_active", METRIC_PREFIX),
        "Number of currently connected WebSocket subscribers"
    ).unwrap();

    /// Total WebSocket connections opened
    pub static ref WS_CONNECTIONS_OPENED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_opened_total", METRIC_PREFIX),
        "Total WebSocket connections opened"
    ).unwrap();

    /// Total WebSocket connections closed
    pub static ref WS_CONNECTIONS_CLOSED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_closed_total", METRIC_PREFIX),
        "Total WebSocket connections closed"
    ).unwrap();

    /// Connections evicted by the heartbeat task
    pub static ref WS_CONNECTIONS_EVICTED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_evicted_total", METRIC_PREFIX),
        "Total WebSocket connections evicted for inactivity"
    ).unwrap();

    // ============================================================================
    // Broadcast Metrics
    // ============================================================================

    /// Total broadcast events emitted
    pub static ref BROADCASTS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_broadcasts_total", METRIC_PREFIX),
        "Total broadcast events emitted"
    ).unwrap();

    /// Per-subscriber deliveries by result (delivered, dropped)
    pub static ref BROADCAST_DELIVERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_broadcast_deliveries_total", METRIC_PREFIX),
        "Per-subscriber broadcast deliveries by result",
        &["result"]
    ).unwrap();
}
