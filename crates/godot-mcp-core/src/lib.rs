//! Core types for the Godot MCP bridge.
//!
//! This crate holds the two envelope vocabularies the bridge speaks: JSON-RPC
//! 2.0 towards the MCP client on stdio, and the command/result envelope of
//! the Godot editor addon. No I/O happens here; callers hand in text and get
//! typed messages back.

pub mod catalog;
pub mod codes;
mod command;
mod error;
mod id;
mod jsonrpc;

pub use catalog::ToolDescriptor;
pub use command::{
    decode_result, HandshakeInfo, RemoteError, ResultStatus, UpstreamCommand, UpstreamResult,
    HANDSHAKE_COMMAND,
};
pub use error::DecodeError;
pub use id::CommandId;
pub use jsonrpc::{
    decode_request, encode_response, ErrorCode, ErrorObject, JsonRpcRequest, JsonRpcResponse,
    ResponsePayload, JSONRPC_VERSION,
};

/// Version this bridge reports to both sides.
pub const BRIDGE_VERSION: &str = "1.0.0";

/// Name this bridge reports in `initialize`.
pub const BRIDGE_NAME: &str = "godot-mcp-bridge";

/// MCP protocol revision answered to `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Upstream connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live link; a connect attempt may be scheduled.
    Disconnected,
    /// Transport open in progress.
    Connecting,
    /// Link is open; commands may be written.
    Connected,
}

impl ConnectionState {
    /// Lowercase name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
