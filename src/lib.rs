//! solarsrv: proxy service for Solarman solar data loggers
//!
//! Accepts TCP connections from data-logging sticks, validates and decodes
//! their binary telemetry frames, optionally relays the raw frames to the
//! vendor collector servers (primary/secondary failover) and publishes
//! decoded readings to an MQTT broker, then acknowledges the logger with a
//! protocol-correct response frame.

pub mod config;
pub mod error;
pub mod forward;
pub mod logging;
pub mod protocol;
pub mod publish;
pub mod server;

pub use config::Config;
pub use error::{Result, SolarSrvError};
pub use server::ProxyServer;
