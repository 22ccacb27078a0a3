// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;

// Domain
pub mod connection_manager;
pub mod provider;
pub mod relay;

// Application layer
pub mod api;
pub mod server;
pub mod websocket;

// Supporting modules
pub mod tasks;
pub mod telemetry;
