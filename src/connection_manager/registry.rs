use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::websocket::{OutboundMessage, ServerMessage};

use super::{BroadcastResult, ConnectionHandle, ConnectionStats};

/// Manages all live subscriber connections
pub struct ConnectionManager {
    /// connection_id -> ConnectionHandle
    connections: DashMap<Uuid, Arc<ConnectionHandle>>,
    total_connected: AtomicU64,
    total_disconnected: AtomicU64,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            total_connected: AtomicU64::new(0),
            total_disconnected: AtomicU64::new(0),
        }
    }

    /// Add a new connection to the set and assign it an id
    pub fn connect(&self, sender: mpsc::Sender<OutboundMessage>) -> Arc<ConnectionHandle> {
        let handle = Arc::new(ConnectionHandle::new(sender));
        self.connections.insert(handle.id, handle.clone());
        self.total_connected.fetch_add(1, Ordering::Relaxed);

        tracing::info!(connection_id = %handle.id, "Client connected");

        handle
    }

    /// Remove a connection from the set. Returns false if it was already gone.
    pub fn disconnect(&self, connection_id: Uuid) -> bool {
        if self.connections.remove(&connection_id).is_some() {
            self.total_disconnected.fetch_add(1, Ordering::Relaxed);
            tracing::info!(connection_id = %connection_id, "Client disconnected");
            true
        } else {
            false
        }
    }

    /// Deliver a message to every connection present when the call starts.
    ///
    /// Fire-and-forget: the message is serialized once and queued on each
    /// connection's outbound buffer without waiting. A subscriber with a full
    /// buffer misses this message; a subscriber whose writer has gone away is
    /// removed from the set.
    pub fn broadcast(&self, message: &ServerMessage) -> BroadcastResult {
        let recipients = self.get_all_connections();

        let outbound = match OutboundMessage::preserialize(message) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize broadcast message");
                return BroadcastResult {
                    recipients: recipients.len(),
                    delivered: 0,
                    dropped: recipients.len(),
                };
            }
        };

        let mut delivered = 0;
        let mut dropped = 0;
        let mut closed = Vec::new();

        for handle in &recipients {
            match handle.try_send(outbound.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    tracing::warn!(
                        connection_id = %handle.id,
                        "Outbound buffer full, dropping broadcast for connection"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    dropped += 1;
                    closed.push(handle.id);
                }
            }
        }

        for connection_id in closed {
            tracing::debug!(connection_id = %connection_id, "Removing closed connection during broadcast");
            self.disconnect(connection_id);
        }

        BroadcastResult {
            recipients: recipients.len(),
            delivered,
            dropped,
        }
    }

    /// Get all connections
    pub fn get_all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections.iter().map(|r| r.value().clone()).collect()
    }

    /// Get connection by ID
    pub fn get_connection(&self, connection_id: Uuid) -> Option<Arc<ConnectionHandle>> {
        self.connections.get(&connection_id).map(|h| h.clone())
    }

    pub fn is_connected(&self, connection_id: Uuid) -> bool {
        self.connections.contains_key(&connection_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get statistics
    pub fn stats(&self) -> ConnectionStats {
        let oldest_connected_at = self
            .connections
            .iter()
            .map(|entry| entry.value().connected_at)
            .min();

        ConnectionStats {
            total_connections: self.connections.len(),
            total_connected: self.total_connected.load(Ordering::Relaxed),
            total_disconnected: self.total_disconnected.load(Ordering::Relaxed),
            oldest_connected_at,
        }
    }

    /// Find connections that have been inactive for longer than the timeout
    pub fn find_stale_connections(&self, timeout_secs: u64) -> Vec<Uuid> {
        let now = chrono::Utc::now();
        let timeout = chrono::Duration::seconds(timeout_secs as i64);

        self.connections
            .iter()
            .filter(|entry| now.signed_duration_since(entry.value().last_activity()) > timeout)
            .map(|entry| *entry.key())
            .collect()
    }

    /// Close and remove stale connections, returning how many were removed
    pub fn cleanup_stale_connections(&self, timeout_secs: u64) -> usize {
        let stale = self.find_stale_connections(timeout_secs);
        let mut removed = 0;

        for conn_id in stale {
            if let Some(handle) = self.get_connection(conn_id) {
                // Ask the socket writer to close; it may already be gone
                let _ = handle.try_send(OutboundMessage::Close);
            }
            if self.disconnect(conn_id) {
                tracing::info!(connection_id = %conn_id, "Removed stale connection due to timeout");
                removed += 1;
            }
        }

        removed
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
