//! Firebase Cloud Messaging client (HTTP v1 API).
//!
//! Authenticates with a service account: a short-lived RS256 assertion is
//! exchanged at the account's `token_uri` for an OAuth2 access token, which is
//! cached until shortly before it expires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use tokio::sync::RwLock;

use crate::config::ProviderConfig;
use crate::metrics::ProviderMetrics;

use super::models::{
    FcmSendRequest, FcmSendResponse, GoogleErrorEnvelope, GoogleTokenResponse, JwtClaims,
};
use super::{ProviderError, PushMessage, PushProvider, ServiceAccountKey};

const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Assertion lifetime requested from the token endpoint
const ASSERTION_TTL_SECS: i64 = 3600;

/// Refresh the cached token this many seconds before it expires
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at > now + TOKEN_REFRESH_MARGIN_SECS
    }
}

pub struct FcmProvider {
    credentials: Arc<ServiceAccountKey>,
    signing_key: EncodingKey,
    endpoint: String,
    token_cache: RwLock<Option<CachedToken>>,
    http_client: reqwest::Client,
}

impl FcmProvider {
    /// Fails with `ProviderError::Credentials` if the private key is not a valid RSA PEM.
    pub fn new(credentials: ServiceAccountKey, config: &ProviderConfig) -> Result<Self, ProviderError> {
        let signing_key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| ProviderError::Credentials(format!("invalid private key: {}", e)))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            credentials: Arc::new(credentials),
            signing_key,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token_cache: RwLock::new(None),
            http_client,
        })
    }

    /// Load credentials from `config.credentials_path` and build the client.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let credentials = ServiceAccountKey::from_file(&config.credentials_path)?;
        tracing::info!(
            project_id = %credentials.project_id,
            client_email = %credentials.client_email,
            "Loaded push provider credentials"
        );
        Self::new(credentials, config)
    }

    pub fn project_id(&self) -> &str {
        &self.credentials.project_id
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint, self.credentials.project_id
        )
    }

    /// Return a cached access token or fetch a new one.
    async fn access_token(&self) -> Result<String, ProviderError> {
        let now = Utc::now().timestamp();
        if let Some(cached) = self.token_cache.read().await.as_ref() {
            if cached.is_fresh(now) {
                return Ok(cached.access_token.clone());
            }
        }

        let mut cache = self.token_cache.write().await;
        // Another request may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Utc::now().timestamp()) {
                return Ok(cached.access_token.clone());
            }
        }

        let fresh = self.fetch_access_token().await?;
        let token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(token)
    }

    fn sign_assertion(&self, now: i64) -> Result<String, ProviderError> {
        let creds = &self.credentials;
        let claims = JwtClaims {
            iss: &creds.client_email,
            sub: &creds.client_email,
            scope: MESSAGING_SCOPE,
            aud: &creds.token_uri,
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(creds.private_key_id.clone());

        encode(&header, &claims, &self.signing_key)
            .map_err(|e| ProviderError::Auth(format!("failed to sign assertion: {}", e)))
    }

    async fn fetch_access_token(&self) -> Result<CachedToken, ProviderError> {
        let now = Utc::now().timestamp();
        let assertion = self.sign_assertion(now)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!(
                "token endpoint returned {}: {}",
                status, text
            )));
        }

        let token: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("malformed token response: {}", e)))?;

        tracing::debug!(expires_in = token.expires_in, "Obtained provider access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}

#[async_trait]
impl PushProvider for FcmProvider {
    #[tracing::instrument(
        name = "provider.fcm.send",
        skip(self, message),
        fields(project_id = %self.credentials.project_id)
    )]
    async fn send(&self, message: &PushMessage) -> Result<String, ProviderError> {
        let start = Instant::now();
        let result = self.send_inner(message).await;
        ProviderMetrics::record_call(result.is_ok(), start.elapsed().as_secs_f64());
        result
    }

    fn name(&self) -> &'static str {
        "fcm"
    }
}

impl FcmProvider {
    async fn send_inner(&self, message: &PushMessage) -> Result<String, ProviderError> {
        let access_token = self.access_token().await?;

        let response = self
            .http_client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&FcmSendRequest { message })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: FcmSendResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
            return Ok(body.name.unwrap_or_default());
        }

        let text = response.text().await.unwrap_or_default();
        Err(api_error(status, &text))
    }
}

/// Map a non-2xx provider response to an error carrying the provider's message.
fn api_error(status: StatusCode, text: &str) -> ProviderError {
    let parsed = serde_json::from_str::<GoogleErrorEnvelope>(text).ok();

    let message = parsed
        .as_ref()
        .and_then(|env| env.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("FCM API error: {} - {}", status, text));

    tracing::warn!(
        status = status.as_u16(),
        provider_status = ?parsed.as_ref().and_then(|env| env.error.status.as_deref()),
        message = %message,
        "Push provider rejected message"
    );

    ProviderError::Api {
        status: status.as_u16(),
        message,
    }
}
