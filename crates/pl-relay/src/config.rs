//! Relay configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration for the relay daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address to bind the listener to
    pub bind_address: String,

    /// Port to listen on (0 picks an ephemeral port)
    pub port: u16,

    /// What to do when a join targets an already occupied role slot
    pub displacement: DisplacementPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            displacement: DisplacementPolicy::Displace,
        }
    }
}

impl RelayConfig {
    /// Get the full listen address (bind_address:port)
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Policy for a join targeting an occupied role slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplacementPolicy {
    /// Evict the current occupant, notifying it with a `displaced` event
    Displace,
    /// Refuse the join and keep the current occupant
    Reject,
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: RelayConfig = toml::from_str(&content)?;
    Ok(config)
}
