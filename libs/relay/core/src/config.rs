//! # Bridge Configuration
//!
//! ## Purpose
//! TOML-backed settings for one bridge process: where the local capture tool
//! publishes, where transported messages get delivered, diagnostic logging
//! defaults, and which transport to bring up.
//!
//! ## Configuration Structure
//! ```toml
//! [source]
//! port = 39539              # local OSC listener
//!
//! [sink]
//! address = "127.0.0.1"
//! port = 39540              # local OSC sender
//!
//! [logging]
//! capacity = 4096           # ring log entries per direction
//! enabled = false
//!
//! [transport]
//! kind = "loopback"         # "grpc", "realtime-relay", "loopback"
//! address = "127.0.0.1"
//! port = 50051
//! ```

use crate::RelayError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub sink: SinkSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub transport: TransportSettings,
}

/// Local message source (receiver) settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceSettings {
    /// Port the local receiver listens on.
    pub port: u16,
}

/// Local message sink (sender) settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SinkSettings {
    pub address: String,
    pub port: u16,
}

/// Diagnostic ring-log settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Entries retained per direction before eviction.
    pub capacity: usize,
    /// Start with message logging already enabled.
    pub enabled: bool,
}

/// Transport selection and endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportSettings {
    /// Transport kind label ("grpc", "realtime-relay", "loopback").
    pub kind: String,
    pub address: String,
    pub port: u16,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self { port: 39539 }
    }
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 39540,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            capacity: crate::log::DEFAULT_LOG_CAPACITY,
            enabled: false,
        }
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            kind: "loopback".to_string(),
            address: "127.0.0.1".to_string(),
            port: 50051,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            source: SourceSettings::default(),
            sink: SinkSettings::default(),
            logging: LoggingSettings::default(),
            transport: TransportSettings::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RelayError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&contents)
            .map_err(|e| RelayError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.logging.capacity == 0 {
            return Err(RelayError::Config(
                "logging.capacity must be > 0".to_string(),
            ));
        }

        if self.sink.address.is_empty() {
            return Err(RelayError::Config(
                "sink.address must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
