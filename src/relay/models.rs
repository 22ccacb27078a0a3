use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

pub const MISSING_FIELDS: &str = "Missing required fields";
pub const NOTIFICATION_SENT: &str = "Notification sent";

/// Body of `POST /send-notification` as received. Fields are optional here so
/// that absent and empty values are reported the same way.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendNotificationRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub token: String,
    pub title: String,
    pub body: String,
}

impl SendNotificationRequest {
    /// Read the named fields from a JSON body. Anything other than an object
    /// has no fields at all.
    pub fn from_json(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Object(fields) => serde_json::from_value(Value::Object(fields))
                .map_err(|e| AppError::InvalidRequest(e.to_string())),
            _ => Err(AppError::InvalidRequest(MISSING_FIELDS.to_string())),
        }
    }

    pub fn validate(self) -> Result<NotificationRequest, AppError> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        match (present(self.token), present(self.title), present(self.body)) {
            (Some(token), Some(title), Some(body)) => Ok(NotificationRequest { token, title, body }),
            _ => Err(AppError::InvalidRequest(MISSING_FIELDS.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendNotificationResponse {
    pub success: bool,
    pub message: String,
}

impl SendNotificationResponse {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: NOTIFICATION_SENT.to_string(),
        }
    }
}
