//! HTTP relay handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::server::AppState;

use super::models::{SendNotificationRequest, SendNotificationResponse, MISSING_FIELDS};

/// Forward one notification to the push provider and rebroadcast it
#[tracing::instrument(name = "http.send_notification", skip(state, payload))]
pub async fn send_notification(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<SendNotificationResponse>> {
    let body = match payload {
        Ok(Json(body)) => body,
        // No JSON body at all reads as an empty request
        Err(JsonRejection::MissingJsonContentType(_)) => {
            return Err(state
                .relay
                .rejected(AppError::InvalidRequest(MISSING_FIELDS.to_string())));
        }
        Err(rejection) => {
            return Err(state
                .relay
                .rejected(AppError::InvalidRequest(rejection.body_text())));
        }
    };

    let request = SendNotificationRequest::from_json(body).map_err(|e| state.relay.rejected(e))?;
    state.relay.relay(request).await?;

    Ok(Json(SendNotificationResponse::sent()))
}
