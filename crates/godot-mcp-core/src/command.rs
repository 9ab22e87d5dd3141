//! Upstream command/result envelope spoken by the Godot editor addon.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codes;
use crate::error::DecodeError;
use crate::id::CommandId;
use crate::jsonrpc::{ErrorCode, ErrorObject};

/// Reserved command sent once per connection to exchange versions.
pub const HANDSHAKE_COMMAND: &str = "mcp_handshake";

/// A command sent to the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamCommand {
    pub id: CommandId,
    pub command: String,
    pub params: Value,
}

impl UpstreamCommand {
    /// Build a command. `null` params become an empty object.
    pub fn new(id: CommandId, command: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        Self {
            id,
            command: command.into(),
            params,
        }
    }

    /// Parameters of the version handshake.
    pub fn handshake_params(server_version: &str) -> Value {
        serde_json::json!({ "server_version": server_version })
    }

    /// Encode as a single text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Outcome flag of an upstream result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Error,
    /// Missing or unrecognised status. Treated as a failure.
    #[default]
    Unknown,
}

impl ResultStatus {
    fn from_wire(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("success") => ResultStatus::Success,
            Some("error") => ResultStatus::Error,
            _ => ResultStatus::Unknown,
        }
    }
}

/// Error body as reported by the editor; either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RemoteError {
    /// Read whatever the editor put under `error`.
    ///
    /// Codes that are neither strings nor integers, and non-string
    /// messages, count as missing. A non-object body has neither.
    fn from_wire(value: &Value) -> Self {
        let code = match value.get("code") {
            Some(Value::String(s)) => Some(ErrorCode::Text(s.clone())),
            Some(Value::Number(n)) => n.as_i64().map(ErrorCode::Number),
            _ => None,
        };
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned);
        Self { code, message }
    }
}

/// A result frame from the editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamResult {
    /// Absent only on results the bridge synthesises itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CommandId>,
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

impl UpstreamResult {
    /// Result handed to a caller that tried to send while disconnected.
    pub fn not_connected() -> Self {
        Self {
            id: None,
            status: ResultStatus::Error,
            data: None,
            error: Some(RemoteError {
                code: Some(ErrorCode::from(codes::NOT_CONNECTED)),
                message: Some(codes::NOT_CONNECTED_MESSAGE.to_string()),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    /// Split into the success payload or a complete error object.
    ///
    /// Missing or empty codes and messages fall back to
    /// [`codes::GODOT_ERROR`] and [`codes::UNKNOWN_ERROR_MESSAGE`].
    pub fn into_outcome(self) -> Result<Value, ErrorObject> {
        if self.is_success() {
            return Ok(self.data.unwrap_or(Value::Null));
        }

        let remote = self.error.unwrap_or_default();
        let code = match remote.code {
            Some(ErrorCode::Text(s)) if s.is_empty() => None,
            other => other,
        };
        let message = remote.message.filter(|m| !m.is_empty());

        Err(ErrorObject {
            code: code.unwrap_or_else(|| ErrorCode::from(codes::GODOT_ERROR)),
            message: message.unwrap_or_else(|| codes::UNKNOWN_ERROR_MESSAGE.to_string()),
        })
    }

    /// Versions reported in a successful handshake result.
    pub fn handshake_info(&self) -> Option<HandshakeInfo> {
        if !self.is_success() {
            return None;
        }
        self.data
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }
}

/// Payload of a successful handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeInfo {
    #[serde(default)]
    pub godot_version: Option<String>,
    #[serde(default)]
    pub addon_version: Option<String>,
}

/// Decode one upstream text frame.
///
/// Only the id has to be well formed. Any other field with an unexpected
/// shape is read as missing, so a result that names its command always
/// reaches the caller waiting on it.
pub fn decode_result(text: &str) -> Result<UpstreamResult, DecodeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::MalformedResult(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(DecodeError::MalformedResult(
            "result must be a JSON object".to_string(),
        ));
    };

    let id = match fields.remove("id") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            serde_json::from_value::<CommandId>(raw)
                .map_err(|e| DecodeError::MalformedResult(format!("invalid id: {e}")))?,
        ),
    };
    let status = ResultStatus::from_wire(fields.get("status"));
    let error = fields.get("error").map(RemoteError::from_wire);
    let data = fields.remove("data");

    Ok(UpstreamResult {
        id,
        status,
        data,
        error,
    })
}
