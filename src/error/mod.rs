use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Client sent an incomplete or malformed request
    #[error("{0}")]
    InvalidRequest(String),

    /// The push provider rejected or failed the call
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let log_message = self.to_string();

        let client_message = match &self {
            // Callers see the provider's own description
            AppError::InvalidRequest(_) | AppError::Provider(_) => log_message.clone(),
            AppError::Config(_) if is_production() => "Configuration error".to_string(),
            AppError::Config(_) => log_message.clone(),
        };

        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), message = %log_message, "Request failed");
        } else {
            tracing::warn!(status = %status.as_u16(), message = %log_message, "Request rejected");
        }

        (status, Json(ErrorResponse { error: client_message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
