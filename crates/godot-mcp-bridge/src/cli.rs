//! Command-line arguments.
//!
//! Kept out of `main.rs` so tests can parse argument lists directly.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{BridgeConfig, ConfigError};

/// Bridge an MCP client on stdio to the Godot editor's WebSocket addon.
#[derive(Parser, Debug)]
#[command(name = "godot-mcp-bridge", version)]
pub struct Cli {
    /// WebSocket URL of the Godot addon.
    #[arg(long, env = "GODOT_WS_URL")]
    pub url: Option<String>,

    /// TOML config file.
    #[arg(long, env = "GODOT_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Delay before each reconnect attempt, in milliseconds.
    #[arg(long)]
    pub reconnect_delay_ms: Option<u64>,

    /// Enable debug logging.
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the effective config: file (if any), then flags and env.
    pub fn resolve_config(&self) -> Result<BridgeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)?,
            None => BridgeConfig::default(),
        };
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(delay) = self.reconnect_delay_ms {
            config.reconnect_delay_ms = delay;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "godot-mcp-bridge",
            "--url",
            "ws://127.0.0.1:9000",
            "--reconnect-delay-ms",
            "250",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.url, "ws://127.0.0.1:9000");
        assert_eq!(config.reconnect_delay_ms, 250);
    }

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "url = \"ws://from-file:1\"\nreconnect_delay_ms = 10").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli =
            Cli::try_parse_from(["godot-mcp-bridge", "--config", &path, "--url", "ws://flag:2"])
                .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.url, "ws://flag:2");
        assert_eq!(config.reconnect_delay_ms, 10);
    }

    #[test]
    fn bad_url_is_rejected() {
        let cli = Cli::try_parse_from(["godot-mcp-bridge", "--url", "localhost:6550"]).unwrap();
        assert!(matches!(
            cli.resolve_config(),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }
}
