use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub device: DeviceConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Phone Manager backend, e.g. https://api.phonemanager.app
    pub base_url: String,

    /// API key sent in the X-API-Key header.
    pub api_key: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// This device's identifier, assigned at registration.
    pub device_id: Uuid,

    /// The location sharing group this device belongs to.
    pub group_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Seconds between device-state refreshes while a screen is watching.
    #[serde(default = "default_location_refresh")]
    pub location_refresh_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            location_refresh_secs: default_location_refresh(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_request_timeout() -> u64 {
    30
}
fn default_location_refresh() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl ClientConfig {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with PMC__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PMC").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// This method creates a config entirely from defaults and overrides,
    /// without relying on config files (which may not be accessible during tests).
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        // Embed defaults directly to avoid file system dependency in tests
        let defaults = r#"
            [api]
            base_url = "http://localhost:8080"
            api_key = "pm_test_key"
            request_timeout_secs = 30

            [device]
            device_id = "550e8400-e29b-41d4-a716-446655440000"
            group_id = "family"

            [polling]
            location_refresh_secs = 30

            [logging]
            level = "info"
            format = "json"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.api.base_url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PMC__API__BASE_URL environment variable must be set".to_string(),
            ));
        }

        if self.api.api_key.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PMC__API__API_KEY environment variable must be set".to_string(),
            ));
        }

        if self.device.group_id.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PMC__DEVICE__GROUP_ID environment variable must be set".to_string(),
            ));
        }

        if self.polling.location_refresh_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "location_refresh_secs cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load_with_defaults() {
        let config = ClientConfig::load_for_test(&[]).expect("Failed to load config");

        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.device.group_id, "family");
        assert_eq!(config.polling.location_refresh_secs, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_override() {
        let config = ClientConfig::load_for_test(&[
            ("polling.location_refresh_secs", "10"),
            ("logging.level", "debug"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.polling.location_refresh_secs, 10);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_validation_missing_api_key() {
        let config =
            ClientConfig::load_for_test(&[("api.api_key", "")]).expect("Failed to load config");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PMC__API__API_KEY"));
    }

    #[test]
    fn test_config_validation_zero_refresh_interval() {
        let config = ClientConfig::load_for_test(&[("polling.location_refresh_secs", "0")])
            .expect("Failed to load config");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("location_refresh_secs"));
    }
}
