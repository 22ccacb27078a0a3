mod settings;

pub use settings::{
    LogFormat, LoggingConfig, OtelConfig, ProviderConfig, ServerConfig, Settings, WebSocketConfig,
};
