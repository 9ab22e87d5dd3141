//! Bridge configuration.
//!
//! Everything has a default, so a config file is optional. A file, when
//! given, is TOML:
//!
//! ```toml
//! url = "ws://localhost:6550"
//! reconnect_delay_ms = 2000
//!
//! [[tools]]
//! name = "get_project_info"
//! description = "Get project information"
//! ```
//!
//! A `[[tools]]` list replaces the built-in catalogue entirely.

use std::path::{Path, PathBuf};
use std::time::Duration;

use godot_mcp_core::catalog::{self, ToolDescriptor};
use godot_mcp_core::{BRIDGE_NAME, BRIDGE_VERSION};
use serde::{Deserialize, Serialize};

/// Where the Godot addon listens by default.
pub const DEFAULT_URL: &str = "ws://localhost:6550";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// WebSocket URL of the editor addon.
    pub url: String,
    /// Fixed delay before each reconnect attempt.
    pub reconnect_delay_ms: u64,
    /// Reported in `initialize`.
    pub server_name: String,
    /// Reported in `initialize` and the upstream handshake.
    pub server_version: String,
    pub tools: Option<Vec<ToolDescriptor>>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            reconnect_delay_ms: 2000,
            server_name: BRIDGE_NAME.to_string(),
            server_version: BRIDGE_VERSION.to_string(),
            tools: None,
        }
    }
}

impl BridgeConfig {
    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ConfigError::UnsupportedScheme(self.url.clone()));
        }
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Configured tools, or the built-in catalogue.
    pub fn tools(&self) -> Vec<ToolDescriptor> {
        self.tools.clone().unwrap_or_else(catalog::builtin_tools)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("upstream url cannot be empty")]
    EmptyUrl,
    #[error("upstream url must start with ws:// or wss://, got: {0}")]
    UnsupportedScheme(String),
}
