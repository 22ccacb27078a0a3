use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::mpsc::error::TrySendError;

use crate::config::WebSocketConfig;
use crate::connection_manager::ConnectionManager;
use crate::metrics::WsMetrics;
use crate::websocket::OutboundMessage;

/// Background task for heartbeat pings and stale connection cleanup
pub struct HeartbeatTask {
    config: WebSocketConfig,
    connection_manager: Arc<ConnectionManager>,
    shutdown: broadcast::Receiver<()>,
}

impl HeartbeatTask {
    pub fn new(
        config: WebSocketConfig,
        connection_manager: Arc<ConnectionManager>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            config,
            connection_manager,
            shutdown,
        }
    }

    /// Run until the shutdown signal fires
    pub async fn run(mut self) {
        let heartbeat_interval = Duration::from_secs(self.config.heartbeat_interval.max(1));
        let cleanup_interval = Duration::from_secs(self.config.cleanup_interval.max(1));
        let connection_timeout = self.config.connection_timeout;

        let mut heartbeat_timer = tokio::time::interval(heartbeat_interval);
        let mut cleanup_timer = tokio::time::interval(cleanup_interval);

        // Skip immediate first tick
        heartbeat_timer.tick().await;
        cleanup_timer.tick().await;

        tracing::info!(
            heartbeat_interval_secs = self.config.heartbeat_interval,
            cleanup_interval_secs = self.config.cleanup_interval,
            connection_timeout_secs = connection_timeout,
            "Heartbeat task started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Heartbeat task received shutdown signal");
                    break;
                }
                _ = heartbeat_timer.tick() => {
                    self.send_heartbeats();
                }
                _ = cleanup_timer.tick() => {
                    self.cleanup_stale_connections(connection_timeout);
                }
            }
        }

        tracing::info!("Heartbeat task stopped");
    }

    /// Queue a ping frame on every connection; a full buffer skips this round
    fn send_heartbeats(&self) {
        let connections = self.connection_manager.get_all_connections();
        if connections.is_empty() {
            return;
        }

        let mut sent = 0usize;
        let mut skipped = 0usize;
        for handle in &connections {
            match handle.try_send(OutboundMessage::Ping) {
                Ok(()) => sent += 1,
                Err(TrySendError::Full(_)) => skipped += 1,
                Err(TrySendError::Closed(_)) => {
                    skipped += 1;
                    self.connection_manager.disconnect(handle.id);
                }
            }
        }

        tracing::debug!(
            total = connections.len(),
            sent = sent,
            skipped = skipped,
            "Heartbeat round completed"
        );
    }

    fn cleanup_stale_connections(&self, timeout_secs: u64) {
        let removed = self.connection_manager.cleanup_stale_connections(timeout_secs);

        if removed > 0 {
            WsMetrics::record_evicted(removed as u64);
            tracing::info!(
                removed = removed,
                timeout_secs = timeout_secs,
                "Cleaned up stale connections"
            );
        }
    }
}
