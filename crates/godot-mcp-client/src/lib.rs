//! Upstream side of the Godot MCP bridge.
//!
//! Keeps a single WebSocket link to the editor addon alive, reconnecting
//! after a fixed delay whenever it drops, and matches result frames to the
//! commands that produced them.

mod connection;
mod correlator;
mod error;
mod transport;

pub use connection::{ConnectionManager, UpstreamEvent};
pub use correlator::{Completion, Correlator};
pub use error::TransportError;
pub use transport::{Connector, Link, WsConnector};
