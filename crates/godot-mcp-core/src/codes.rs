//! Error codes sent on the downstream channel.
//!
//! The editor addon reports string codes, so the bridge's own codes are
//! strings too. Remote codes are passed through untouched.

/// Downstream line was not valid JSON.
pub const PARSE_ERROR: &str = "PARSE_ERROR";
/// Message was JSON but not a usable JSON-RPC 2.0 request.
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
/// Method is not one the bridge knows.
pub const METHOD_NOT_FOUND: &str = "METHOD_NOT_FOUND";
/// `tools/call` without a usable tool name.
pub const INVALID_PARAMS: &str = "INVALID_PARAMS";
/// Upstream link is not open.
pub const NOT_CONNECTED: &str = "NOT_CONNECTED";
/// Fallback when the editor reports a failure without a code.
pub const GODOT_ERROR: &str = "GODOT_ERROR";

/// Fallback message for remote failures without one.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";
/// Message attached to synthetic not-connected results.
pub const NOT_CONNECTED_MESSAGE: &str = "Not connected to Godot WebSocket server";
