//! Error handling for the Solarman proxy service

use thiserror::Error;

use crate::protocol::{FrameError, PayloadError};

/// Service-level error type
#[derive(Debug, Error)]
pub enum SolarSrvError {
    /// Configuration loading or validation errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Socket and file I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// MQTT broker errors
    #[error("MQTT error: {0}")]
    Mqtt(String),

    /// Payload serialization errors
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Inbound frame failed envelope validation
    #[error("frame validation error: {0}")]
    Frame(#[from] FrameError),

    /// Validated frame carried an undecodable payload
    #[error("payload decode error: {0}")]
    Payload(#[from] PayloadError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SolarSrvError>;

impl From<serde_yaml::Error> for SolarSrvError {
    fn from(err: serde_yaml::Error) -> Self {
        SolarSrvError::Config(err.to_string())
    }
}

impl From<rumqttc::ClientError> for SolarSrvError {
    fn from(err: rumqttc::ClientError) -> Self {
        SolarSrvError::Mqtt(err.to_string())
    }
}

impl From<serde_json::Error> for SolarSrvError {
    fn from(err: serde_json::Error) -> Self {
        SolarSrvError::Serialization(err.to_string())
    }
}
