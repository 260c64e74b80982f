//! Root configuration type.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, ContractConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig,
    StoreConfig,
};

/// Complete inventory service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use inventory_config::InventoryConfig;
///
/// let config = InventoryConfig::default();
/// assert_eq!(config.server.port, 8080);
/// assert_eq!(config.store.first_id, 1000);
/// assert!(config.contract.validate_requests);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct InventoryConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Item store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Contract validation configuration.
    #[serde(default)]
    pub contract: ContractConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl InventoryConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.host",
                format!("not an IP address: {}", self.server.host),
            ));
        }

        for (field, value) in [
            ("server.shutdown_timeout_secs", self.server.shutdown_timeout_secs),
            ("server.request_timeout_ms", self.server.request_timeout_ms),
            (
                "server.header_read_timeout_secs",
                self.server.header_read_timeout_secs,
            ),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid_value(field, "must be greater than 0"));
            }
        }

        if self.store.first_id < 0 {
            return Err(ConfigError::invalid_value(
                "store.first_id",
                "must not be negative",
            ));
        }

        if self.logging.enabled && self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                ..ServerConfig::default()
            },
            logging: LoggingConfig {
                enabled: true,
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
            ..Self::default()
        }
    }
}
