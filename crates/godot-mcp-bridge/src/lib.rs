//! Stdio MCP server backed by the Godot editor.
//!
//! [`Bridge`] reads JSON-RPC requests line by line, answers the ones it can
//! locally, and forwards `tools/call` to the editor through a
//! [`godot_mcp_client::ConnectionManager`].

pub mod bridge;
pub mod cli;
pub mod config;
mod error;

pub use bridge::{Bridge, Dispatch, PendingReply};
pub use config::{BridgeConfig, ConfigError};
pub use error::BridgeError;
