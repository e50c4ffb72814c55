use crate::algorithms::UpdatePolicyConfig;
use crate::source::LocationRequest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Top-level configuration for location sharing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SharingConfig {
    /// Thresholds deciding which fixes are sent
    pub policy: UpdatePolicyConfig,
    /// Cadence requested from the device positioning API
    pub location_request: LocationRequest,
    /// Backend endpoint settings
    pub api: ApiEndpointConfig,
    /// Enable debug logging
    pub debug_logging: bool,
}

/// REST backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEndpointConfig {
    /// Base URL including the API prefix, e.g. `https://host/api/`
    pub base_url: String,
    /// Path of the location update endpoint relative to the base URL
    pub location_path: String,
    /// Connect and request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for ApiEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/".to_string(),
            location_path: "users/location".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    /// Configuration file I/O error
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON serialization/deserialization error
    #[error("{message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },
    /// No file path to save to
    #[error("no file path set for saving configuration")]
    NoFilePath,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors
    pub errors: Vec<ConfigError>,
    /// Validation warnings
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn invalid(&mut self, parameter: &str, value: impl ToString, reason: &str) {
        self.errors.push(ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        });
    }

    fn into_first_error(self) -> Option<ConfigError> {
        self.errors.into_iter().next()
    }
}

/// Main configuration manager
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    config: SharingConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &SharingConfig {
        &self.config
    }

    /// Replace the configuration after validation
    pub fn update_config(&mut self, config: SharingConfig) -> ConfigResult<()> {
        let validation = Self::validate(&config);
        if let Some(error) = validation.into_first_error() {
            return Err(error);
        }
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> ConfigResult<()> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            message: format!("failed to read config file '{}'", path_str),
            source,
        })?;

        let config: SharingConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Serialization {
                message: format!("failed to parse config file '{}'", path_str),
                source,
            })?;

        let validation = Self::validate(&config);
        for warning in &validation.warnings {
            warn!(path = %path_str, "{}", warning);
        }
        if let Some(error) = validation.into_first_error() {
            return Err(error);
        }

        info!(path = %path_str, "configuration loaded");
        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> ConfigResult<()> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content =
            serde_json::to_string_pretty(&self.config).map_err(|source| ConfigError::Serialization {
                message: "failed to serialize config".to_string(),
                source,
            })?;

        fs::write(&path, content).map_err(|source| ConfigError::Io {
            message: format!("failed to write config file '{}'", path_str),
            source,
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> ConfigResult<()> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::NoFilePath),
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    // Runtime Parameter Adjustment Methods

    /// Update the distance threshold, returning the previous value
    pub fn set_min_distance(&mut self, min_distance_m: f64) -> ConfigResult<f64> {
        let mut candidate = self.config.clone();
        candidate.policy.min_distance_m = min_distance_m;
        self.apply(candidate)
            .map(|old| old.policy.min_distance_m)
    }

    /// Update the heartbeat interval, returning the previous value
    pub fn set_min_interval(&mut self, min_interval_ms: u64) -> ConfigResult<u64> {
        let mut candidate = self.config.clone();
        candidate.policy.min_interval_ms = min_interval_ms;
        self.apply(candidate)
            .map(|old| old.policy.min_interval_ms)
    }

    /// Update the backend base URL, returning the previous value
    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> ConfigResult<String> {
        let mut candidate = self.config.clone();
        candidate.api.base_url = base_url.into();
        self.apply(candidate).map(|old| old.api.base_url)
    }

    fn apply(&mut self, candidate: SharingConfig) -> ConfigResult<SharingConfig> {
        let validation = Self::validate(&candidate);
        if let Some(error) = validation.into_first_error() {
            return Err(error);
        }
        self.is_modified = true;
        Ok(std::mem::replace(&mut self.config, candidate))
    }

    /// Validate a configuration
    pub fn validate(config: &SharingConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        let policy = &config.policy;
        if !policy.min_distance_m.is_finite() || policy.min_distance_m <= 0.0 {
            result.invalid(
                "policy.min_distance_m",
                policy.min_distance_m,
                "distance threshold must be a positive number of meters",
            );
        }
        if policy.min_interval_ms == 0 {
            result.invalid(
                "policy.min_interval_ms",
                policy.min_interval_ms,
                "heartbeat interval must be positive",
            );
        }

        let request = &config.location_request;
        if request.interval_ms == 0 {
            result.invalid(
                "location_request.interval_ms",
                request.interval_ms,
                "update interval must be positive",
            );
        }
        if request.fastest_interval_ms > request.interval_ms {
            result.invalid(
                "location_request.fastest_interval_ms",
                request.fastest_interval_ms,
                "fastest interval cannot exceed the nominal interval",
            );
        }
        if !request.min_update_distance_m.is_finite() || request.min_update_distance_m < 0.0 {
            result.invalid(
                "location_request.min_update_distance_m",
                request.min_update_distance_m,
                "minimum update distance must be zero or more meters",
            );
        }
        if policy.min_interval_ms < request.interval_ms {
            result.warnings.push(format!(
                "heartbeat interval {}ms is shorter than the source interval {}ms; it will fire at the source cadence",
                policy.min_interval_ms, request.interval_ms
            ));
        }

        let api = &config.api;
        if api.base_url.is_empty() {
            result.invalid("api.base_url", "", "base URL is required");
        } else if !(api.base_url.starts_with("http://") || api.base_url.starts_with("https://")) {
            result.invalid("api.base_url", &api.base_url, "base URL must be http or https");
        }
        if api.location_path.trim_matches('/').is_empty() {
            result.invalid("api.location_path", &api.location_path, "location path is required");
        }
        if api.timeout_secs == 0 || api.timeout_secs > 300 {
            result.invalid("api.timeout_secs", api.timeout_secs, "timeout must be 1-300 seconds");
        }

        result
    }
}
