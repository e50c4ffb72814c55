//! Utility modules for configuration

pub mod config;

pub use config::{ApiEndpointConfig, ConfigError, ConfigResult, ConfigurationManager, SharingConfig};
