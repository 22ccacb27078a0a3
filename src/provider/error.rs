use thiserror::Error;

/// Errors raised while delivering a message through the push provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to load provider credentials: {0}")]
    Credentials(String),

    #[error("Failed to obtain provider access token: {0}")]
    Auth(String),

    #[error("Push provider request failed: {0}")]
    Request(String),

    /// The provider answered with an error; `message` is its own description.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse push provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// HTTP status reported by the provider, if it got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Request(err.to_string())
    }
}
