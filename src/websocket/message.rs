use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Payload of a `new-notification` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub title: String,
    pub body: String,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    NewNotification(BroadcastEvent),
    Pong,
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn new_notification(event: BroadcastEvent) -> Self {
        Self::NewNotification(event)
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// What a connection's socket writer is asked to do
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// Serialized by the writer
    Raw(ServerMessage),
    /// Already serialized once for many recipients
    Serialized(Arc<str>),
    /// WebSocket ping frame
    Ping,
    /// Close the socket
    Close,
}

impl OutboundMessage {
    pub fn preserialize(message: &ServerMessage) -> Result<Self, serde_json::Error> {
        let text = serde_json::to_string(message)?;
        Ok(Self::Serialized(Arc::from(text)))
    }
}
