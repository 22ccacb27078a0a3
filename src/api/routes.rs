use axum::{
    routing::{get, post},
    Router,
};

use crate::relay::send_notification;
use crate::server::AppState;

use super::health::{health, stats};
use super::metrics::prometheus_metrics;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Relay
        .route("/send-notification", post(send_notification))
}
