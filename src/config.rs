//! Configuration for the DrishtiLink daemon
//!
//! Loads configuration from a TOML file with the parameters needed for the
//! networking core: the three fixed ports, the multicast group, and the
//! beacon interval.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
}

/// Network configuration (ports, discovery group, beacon pacing)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Address the TCP listeners bind to
    ///
    /// Examples:
    /// - `0.0.0.0` - All interfaces
    /// - `127.0.0.1` - Localhost only
    pub bind_address: String,
    /// TCP port for the video streaming channel
    pub video_port: u16,
    /// TCP port for the robot control channel
    pub control_port: u16,
    /// UDP port the discovery announcement is sent to
    pub discovery_port: u16,
    /// Multicast group the discovery announcement is sent to
    pub multicast_group: String,
    /// Milliseconds between discovery announcements
    pub beacon_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log output (stdout, stderr, or file path)
    pub output: String,
}

impl NetworkConfig {
    /// Bind address for the video channel listener
    pub fn video_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.video_port)
    }

    /// Bind address for the control channel listener
    pub fn control_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    /// Destination address for discovery announcements
    pub fn discovery_target(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.multicast_group, self.discovery_port)
            .parse()
            .map_err(|e| Error::Config(format!("bad multicast group: {}", e)))
    }

    /// Interval between discovery announcements
    pub fn beacon_interval(&self) -> Duration {
        Duration::from_millis(self.beacon_interval_ms)
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                bind_address: "0.0.0.0".to_string(),
                video_port: 9989,
                control_port: 9990,
                discovery_port: 9988,
                multicast_group: "239.255.67.60".to_string(),
                beacon_interval_ms: 250,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                output: "stdout".to_string(),
            },
        }
    }
}
