use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

/// Console log output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// `pretty` or `json`
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Push provider (FCM) settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Path to the service account JSON file
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    /// Base URL of the messaging API
    #[serde(default = "default_provider_endpoint")]
    pub endpoint: String,
    /// HTTP timeout for provider calls in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// Heartbeat interval in seconds (server sends ping)
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,
    /// Connection timeout in seconds (disconnect if no activity)
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
    /// Cleanup task interval in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
    /// Outbound buffer per connection
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_credentials_path() -> String {
    "serviceAccountKey.json".to_string()
}

fn default_provider_endpoint() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_provider_timeout() -> u64 {
    30
}

fn default_heartbeat_interval() -> u64 {
    25
}

fn default_connection_timeout() -> u64 {
    60
}

fn default_cleanup_interval() -> u64 {
    30
}

fn default_channel_buffer() -> usize {
    32
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "push-relay-service".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("provider.credentials_path", default_credentials_path())?
            .set_default("provider.endpoint", default_provider_endpoint())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // RELAY_SERVER__HOST, RELAY_PROVIDER__CREDENTIALS_PATH, ...
            .add_source(
                Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain PORT wins over everything else
            .set_override_option("server.port", port_override(env::var("PORT").ok()))?;

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// An unset or empty `PORT` leaves the configured port in place
fn port_override(raw: Option<String>) -> Option<String> {
    raw.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            endpoint: default_provider_endpoint(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: default_heartbeat_interval(),
            connection_timeout: default_connection_timeout(),
            cleanup_interval: default_cleanup_interval(),
            channel_buffer: default_channel_buffer(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server_addr(), "0.0.0.0:3000");
        assert_eq!(settings.provider.credentials_path, "serviceAccountKey.json");
        assert_eq!(settings.provider.timeout_secs, 30);
        assert!(!settings.otel.enabled);
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_json_log_format_parses() {
        let settings: Settings = Config::builder()
            .set_override("logging.format", "json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_partial_sources_fall_back_to_defaults() {
        let settings: Settings = Config::builder()
            .set_override("server.port", 4100)
            .unwrap()
            .set_override("websocket.connection_timeout", 5)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 4100);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.websocket.connection_timeout, 5);
        assert_eq!(settings.websocket.heartbeat_interval, 25);
        assert_eq!(settings.provider.endpoint, "https://fcm.googleapis.com");
    }

    #[test]
    fn test_empty_port_falls_back_to_default() {
        assert_eq!(port_override(Some(String::new())), None);
        assert_eq!(port_override(Some("  ".to_string())), None);
        assert_eq!(port_override(None), None);
        assert_eq!(port_override(Some("8088".to_string())), Some("8088".to_string()));

        let settings: Settings = Config::builder()
            .set_override_option("server.port", port_override(Some(String::new())))
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_port_string_override_parses() {
        let settings: Settings = Config::builder()
            .set_override_option("server.port", Some("8088".to_string()))
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 8088);
    }
}
