//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    BROADCASTS_TOTAL, BROADCAST_DELIVERIES_TOTAL, PROVIDER_CALL_LATENCY, RELAY_REQUESTS_TOTAL,
    WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_CLOSED, WS_CONNECTIONS_EVICTED, WS_CONNECTIONS_OPENED,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

pub struct RelayMetrics;

impl RelayMetrics {
    pub fn record_sent() {
        RELAY_REQUESTS_TOTAL.with_label_values(&["sent"]).inc();
    }

    pub fn record_rejected() {
        RELAY_REQUESTS_TOTAL.with_label_values(&["rejected"]).inc();
    }

    pub fn record_provider_failed() {
        RELAY_REQUESTS_TOTAL
            .with_label_values(&["provider_failed"])
            .inc();
    }
}

pub struct ProviderMetrics;

impl ProviderMetrics {
    /// Record one provider call and its latency
    pub fn record_call(success: bool, elapsed_secs: f64) {
        let result = if success { "ok" } else { "error" };
        PROVIDER_CALL_LATENCY
            .with_label_values(&[result])
            .observe(elapsed_secs);
    }
}

pub struct WsMetrics;

impl WsMetrics {
    pub fn record_opened() {
        WS_CONNECTIONS_OPENED.inc();
        WS_CONNECTIONS_ACTIVE.inc();
    }

    pub fn record_closed() {
        WS_CONNECTIONS_CLOSED.inc();
        WS_CONNECTIONS_ACTIVE.dec();
    }

    pub fn record_evicted(count: u64) {
        WS_CONNECTIONS_EVICTED.inc_by(count);
    }
}

pub struct BroadcastMetrics;

impl BroadcastMetrics {
    pub fn record(delivered: u64, dropped: u64) {
        BROADCASTS_TOTAL.inc();
        BROADCAST_DELIVERIES_TOTAL
            .with_label_values(&["delivered"])
            .inc_by(delivered);
        if dropped > 0 {
            BROADCAST_DELIVERIES_TOTAL
                .with_label_values(&["dropped"])
                .inc_by(dropped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_recorded_metrics() {
        RelayMetrics::record_sent();
        BroadcastMetrics::record(2, 0);

        let output = encode_metrics().unwrap();
        assert!(output.contains("relay_requests_total"));
        assert!(output.contains("relay_broadcasts_total"));
    }
}
