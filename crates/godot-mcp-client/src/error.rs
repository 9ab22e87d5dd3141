use tokio_tungstenite::tungstenite;

/// Failure of the upstream link itself.
///
/// These never reach a waiting caller; they only drive the connection
/// state machine.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("link closed")]
    Closed,
}
