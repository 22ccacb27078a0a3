use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::connection_manager::{BroadcastResult, ConnectionManager};
use crate::error::{AppError, Result};
use crate::metrics::{BroadcastMetrics, RelayMetrics};
use crate::provider::{PushMessage, PushProvider};
use crate::websocket::{BroadcastEvent, ServerMessage};

use super::models::{NotificationRequest, SendNotificationRequest};

/// Result of a successful relay
#[derive(Debug, Clone, Serialize)]
pub struct RelayOutcome {
    /// Provider-assigned message id
    pub message_id: String,
    pub broadcast: BroadcastResult,
}

#[derive(Debug, Default)]
struct RelayStats {
    sent: AtomicU64,
    rejected: AtomicU64,
    provider_failed: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelayStatsSnapshot {
    pub sent: u64,
    pub rejected: u64,
    pub provider_failed: u64,
}

/// Forwards one notification to the push provider and, only once the
/// provider has accepted it, rebroadcasts it to every live subscriber.
pub struct NotificationRelay {
    provider: Arc<dyn PushProvider>,
    connection_manager: Arc<ConnectionManager>,
    stats: RelayStats,
}

impl NotificationRelay {
    pub fn new(provider: Arc<dyn PushProvider>, connection_manager: Arc<ConnectionManager>) -> Self {
        Self {
            provider,
            connection_manager,
            stats: RelayStats::default(),
        }
    }

    #[tracing::instrument(name = "relay.send", skip(self, request), fields(provider = self.provider.name()))]
    pub async fn relay(&self, request: SendNotificationRequest) -> Result<RelayOutcome> {
        let request = request.validate().map_err(|e| self.rejected(e))?;
        let NotificationRequest { token, title, body } = request;

        let message = PushMessage::new(token, title, body);

        let message_id = match self.provider.send(&message).await {
            Ok(id) => id,
            Err(e) => {
                self.stats.provider_failed.fetch_add(1, Ordering::Relaxed);
                RelayMetrics::record_provider_failed();
                return Err(AppError::Provider(e));
            }
        };

        let PushMessage { notification, .. } = message;
        let event = ServerMessage::new_notification(BroadcastEvent {
            title: notification.title,
            body: notification.body,
        });
        let broadcast = self.connection_manager.broadcast(&event);

        self.stats.sent.fetch_add(1, Ordering::Relaxed);
        RelayMetrics::record_sent();
        BroadcastMetrics::record(broadcast.delivered as u64, broadcast.dropped as u64);

        tracing::info!(
            message_id = %message_id,
            recipients = broadcast.recipients,
            delivered = broadcast.delivered,
            dropped = broadcast.dropped,
            "Notification sent and broadcast"
        );

        Ok(RelayOutcome {
            message_id,
            broadcast,
        })
    }

    /// Count a request rejected before reaching the provider
    pub fn rejected(&self, error: AppError) -> AppError {
        self.stats.rejected.fetch_add(1, Ordering::Relaxed);
        RelayMetrics::record_rejected();
        error
    }

    pub fn stats(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            sent: self.stats.sent.load(Ordering::Relaxed),
            rejected: self.stats.rejected.load(Ordering::Relaxed),
            provider_failed: self.stats.provider_failed.load(Ordering::Relaxed),
        }
    }
}
