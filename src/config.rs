//! Server configuration parameters
//!
//! All tunable parameters for the ground-control server.
//! Defaults can be overridden by a JSON file and then by command-line flags.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address
    pub bind_addr: String,
    /// Telemetry link
    pub serial: SerialConfig,
}

/// Serial telemetry link parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Run the ingestor at all (false = HTTP surface only)
    pub enabled: bool,
    /// Device path of the controller UART
    pub device: String,
    /// Line rate in baud
    pub baud: u32,
    /// Per-read timeout (milliseconds)
    pub read_timeout_ms: u64,
    /// Delay between reconnect attempts (milliseconds)
    pub retry_delay_ms: u64,
    /// Longest unterminated line kept before it is discarded (bytes)
    pub max_line_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".into(),
            serial: SerialConfig::default(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device: "/dev/serial0".into(),
            baud: 115_200,
            read_timeout_ms: 1000,
            retry_delay_ms: 1000,
            max_line_bytes: 4096,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl ServerConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(Error::Config("bind_addr is not a socket address"));
        }
        let s = &self.serial;
        if s.enabled && s.device.trim().is_empty() {
            return Err(Error::Config("serial.device is empty"));
        }
        if s.baud == 0 {
            return Err(Error::Config("serial.baud must be non-zero"));
        }
        if s.read_timeout_ms == 0 {
            return Err(Error::Config("serial.read_timeout_ms must be non-zero"));
        }
        if s.retry_delay_ms == 0 {
            return Err(Error::Config("serial.retry_delay_ms must be non-zero"));
        }
        if s.max_line_bytes < 16 {
            return Err(Error::Config("serial.max_line_bytes must be at least 16"));
        }
        Ok(())
    }
}
