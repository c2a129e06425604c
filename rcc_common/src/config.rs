//! TOML configuration loading for the ride control process.
//!
//! # TOML Example
//!
//! ```toml
//! log_level = "info"
//!
//! [serial]
//! port = "/dev/ttyAMA1"
//! address = 0x80
//! auto_recover = true
//!
//! [supervisor]
//! telemetry_period_s = 2.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parsing failed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for configuration.
///
/// Serializes to lowercase strings: "trace", "debug", "info", "warn", "error".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level verbosity.
    Trace,
    /// Debug-level verbosity.
    Debug,
    /// Info-level verbosity (default).
    #[default]
    Info,
    /// Warning-level verbosity.
    Warn,
    /// Error-level verbosity.
    Error,
}

impl LogLevel {
    /// Corresponding `tracing` level.
    pub const fn as_tracing(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Serial link configuration for the motor controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Serial device path, e.g. `/dev/ttyAMA1`.
    pub port: String,

    /// Packet-serial device address (0x80..=0x87).
    #[serde(default = "default_address")]
    pub address: u8,

    /// Reopen the port with backoff after an I/O failure.
    #[serde(default)]
    pub auto_recover: bool,
}

fn default_address() -> u8 {
    0x80
}

/// Supervisor loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Period between telemetry log lines [s].
    #[serde(default = "default_telemetry_period")]
    pub telemetry_period_s: f64,
}

fn default_telemetry_period() -> f64 {
    2.0
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            telemetry_period_s: 2.0,
        }
    }
}

/// Root configuration for the ride control process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideConfig {
    /// Log verbosity.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Motor controller serial link.
    pub serial: SerialConfig,

    /// Supervisor loop settings.
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

impl RideConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let config: Self =
            toml::from_str(&text).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `serial.port` is empty
    /// - `serial.address` is outside 0x80..=0x87
    /// - `supervisor.telemetry_period_s` is not positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.port.is_empty() {
            return Err(ConfigError::ValidationError(
                "serial.port cannot be empty".to_string(),
            ));
        }
        if !(0x80..=0x87).contains(&self.serial.address) {
            return Err(ConfigError::ValidationError(format!(
                "serial.address {:#04x} outside 0x80..=0x87",
                self.serial.address
            )));
        }
        if self.supervisor.telemetry_period_s <= 0.0 {
            return Err(ConfigError::ValidationError(
                "supervisor.telemetry_period_s must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
