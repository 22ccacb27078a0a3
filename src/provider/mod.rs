//! Push provider abstraction.
//!
//! The relay only needs one operation from a provider: deliver a single
//! message to a single device token and report success or the provider's
//! failure. `FcmProvider` is the production implementation.

mod error;
mod fcm;
mod models;

use async_trait::async_trait;

pub use error::ProviderError;
pub use fcm::FcmProvider;
pub use models::{PushMessage, PushNotification, ServiceAccountKey};

#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Deliver one message. Returns the provider-assigned message id.
    async fn send(&self, message: &PushMessage) -> Result<String, ProviderError>;

    /// Short provider name used in logs and metrics
    fn name(&self) -> &'static str;
}
