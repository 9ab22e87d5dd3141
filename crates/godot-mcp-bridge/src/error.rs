use std::io;

/// Errors that end a bridge run.
///
/// Per-request failures never show up here; they become error replies.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("failed to read from client: {0}")]
    Read(#[source] io::Error),
    #[error("failed to write to client: {0}")]
    Write(#[source] io::Error),
    #[error("failed to encode reply: {0}")]
    Encode(#[from] serde_json::Error),
}
