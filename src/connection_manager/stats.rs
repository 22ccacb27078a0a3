//! Connection statistics

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Connection statistics
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub total_connected: u64,
    pub total_disconnected: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_connected_at: Option<DateTime<Utc>>,
}
