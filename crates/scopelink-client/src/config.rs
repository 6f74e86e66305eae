//! Client configuration
//!
//! Loaded from TOML at startup, falls back to defaults if no config file
//! exists. Command-line flags override individual values afterwards.

use scopelink_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// WebSocket endpoint of the scope server.
    pub url: String,
    /// Sent as an `auth` request right after connecting.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Make a scope current as soon as it is entered, if none is current.
    pub autofocus: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix rendered lines with the local time.
    pub timestamps: bool,
}

fn default_url() -> String {
    "ws://127.0.0.1:18790/ws".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: None,
        }
    }
}

impl ClientConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// The server URL, checked to be a ws:// or wss:// endpoint.
    pub fn server_url(&self) -> Result<url::Url> {
        let url = url::Url::parse(&self.server.url)
            .map_err(|e| Error::ConfigError(format!("bad server url {}: {}", self.server.url, e)))?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(Error::ConfigError(format!(
                "server url must use ws or wss, got {}",
                other
            ))),
        }
    }
}
