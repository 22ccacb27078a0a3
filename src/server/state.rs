use std::sync::Arc;

use crate::config::Settings;
use crate::connection_manager::ConnectionManager;
use crate::provider::PushProvider;
use crate::relay::NotificationRelay;

/// Everything a request or connection needs, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub connection_manager: Arc<ConnectionManager>,
    pub relay: Arc<NotificationRelay>,
}

impl AppState {
    pub fn new(settings: Settings, provider: Arc<dyn PushProvider>) -> Self {
        let connection_manager = Arc::new(ConnectionManager::new());
        let relay = Arc::new(NotificationRelay::new(provider, connection_manager.clone()));

        Self {
            settings: Arc::new(settings),
            connection_manager,
            relay,
        }
    }
}
