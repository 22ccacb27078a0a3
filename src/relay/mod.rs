//! The notification relay: validate, forward to the push provider, and
//! rebroadcast to live subscribers on success.

mod handlers;
mod models;
mod service;

pub use handlers::send_notification;
pub use models::{
    NotificationRequest, SendNotificationRequest, SendNotificationResponse, MISSING_FIELDS,
    NOTIFICATION_SENT,
};
pub use service::{NotificationRelay, RelayOutcome, RelayStatsSnapshot};
