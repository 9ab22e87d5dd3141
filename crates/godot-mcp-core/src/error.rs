use serde_json::Value;

use crate::codes;
use crate::jsonrpc::JsonRpcResponse;

/// Failure to turn raw text into an envelope.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    /// Input is not JSON at all. No id can be recovered.
    #[error("Invalid JSON: {0}")]
    Parse(String),
    /// Input is JSON but not an acceptable request. Carries whatever id was
    /// present so the reply can still be correlated.
    #[error("{message}")]
    InvalidRequest { id: Value, message: String },
    /// Upstream frame is JSON but not a result envelope.
    #[error("malformed result: {0}")]
    MalformedResult(String),
}

impl DecodeError {
    /// The downstream reply for a failed request decode.
    ///
    /// Upstream decode failures have no downstream counterpart and map to
    /// `None`.
    pub fn into_response(self) -> Option<JsonRpcResponse> {
        match self {
            DecodeError::Parse(_) => {
                let message = self.to_string();
                Some(JsonRpcResponse::error(Value::Null, codes::PARSE_ERROR, message))
            }
            DecodeError::InvalidRequest { id, message } => {
                Some(JsonRpcResponse::error(id, codes::INVALID_REQUEST, message))
            }
            DecodeError::MalformedResult(_) => None,
        }
    }
}
