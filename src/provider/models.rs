use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ProviderError;

/// Service account credentials as downloaded from the Firebase console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    /// Read and parse a service account file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(raw).map_err(|e| ProviderError::Credentials(e.to_string()))
    }
}

/// A single push message addressed to one device token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub token: String,
    pub notification: PushNotification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

impl PushMessage {
    pub fn new(
        token: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            notification: PushNotification {
                title: title.into(),
                body: body.into(),
            },
        }
    }
}

/// `messages:send` request envelope
#[derive(Debug, Serialize)]
pub(crate) struct FcmSendRequest<'a> {
    pub message: &'a PushMessage,
}

/// `messages:send` success body
#[derive(Debug, Deserialize)]
pub(crate) struct FcmSendResponse {
    pub name: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
pub(crate) struct GoogleErrorEnvelope {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleErrorBody {
    pub message: Option<String>,
    pub status: Option<String>,
}

/// JWT claims for the OAuth2 JWT-bearer grant
#[derive(Debug, Serialize)]
pub(crate) struct JwtClaims<'a> {
    pub iss: &'a str,
    pub sub: &'a str,
    pub scope: &'a str,
    pub aud: &'a str,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}
