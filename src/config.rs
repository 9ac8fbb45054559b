//! Service configuration
//!
//! Loaded once at startup from a YAML file and read-only afterwards.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolarSrvError};

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (use 0.0.0.0 to listen on all interfaces)
    pub listen_address: String,
    /// Listen port
    pub listen_port: u16,
    /// Per-connection read/write timeout in seconds
    pub connection_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            listen_port: 10000,
            connection_timeout_secs: 30,
        }
    }
}

/// Upstream collector forwarding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardConfig {
    /// Enables relaying raw frames to the collector servers
    pub enabled: bool,
    /// Primary collector address
    pub primary_address: String,
    /// Primary collector port
    pub primary_port: u16,
    /// Secondary collector, used only when the primary fails
    pub secondary_address: String,
    /// Secondary collector port
    pub secondary_port: u16,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            primary_address: "data1.solarmanpv.com".to_string(),
            primary_port: 10000,
            secondary_address: "data2.solarmanpv.com".to_string(),
            secondary_port: 10000,
        }
    }
}

/// MQTT publishing settings
#[derive(Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Enables publishing decoded payloads to the broker
    pub enabled: bool,
    /// Broker hostname
    pub hostname: String,
    /// Broker port
    pub port: u16,
    /// Client id presented to the broker
    pub client_id: String,
    /// Optional username
    pub username: Option<String>,
    /// Optional password
    pub password: Option<String>,
    /// Topic prefix; full topics are `{base_topic}/{serial}/{kind}`
    pub base_topic: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            hostname: "localhost".to_string(),
            port: 1883,
            client_id: "solarsrv".to_string(),
            username: None,
            password: None,
            base_topic: "solarsrv".to_string(),
        }
    }
}

// Keep the password out of startup logs
impl fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttConfig")
            .field("enabled", &self.enabled)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("base_topic", &self.base_topic)
            .finish()
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level filter (overridden by RUST_LOG)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub forward: ForwardConfig,
    pub mqtt: MqttConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SolarSrvError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}
