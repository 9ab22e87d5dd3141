//! Downstream JSON-RPC 2.0 envelope.
//!
//! One message per line. Requests carry an optional id (absent for
//! notifications) which is echoed verbatim in the reply.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::DecodeError;

/// The only protocol tag the bridge accepts.
pub const JSONRPC_VERSION: &str = "2.0";

/// An incoming request or notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// `None` when the field is absent. An explicit `null` is `Some(Null)`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Notifications never get a reply.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Id to put on the reply.
    pub fn reply_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Error code: the bridge's own are strings, remote ones may be anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Text(String),
    Number(i64),
}

impl From<&str> for ErrorCode {
    fn from(s: &str) -> Self {
        ErrorCode::Text(s.to_string())
    }
}

impl From<String> for ErrorCode {
    fn from(s: String) -> Self {
        ErrorCode::Text(s)
    }
}

impl From<i64> for ErrorCode {
    fn from(n: i64) -> Self {
        ErrorCode::Number(n)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Text(s) => f.write_str(s),
            ErrorCode::Number(n) => write!(f, "{n}"),
        }
    }
}

/// `{code, message}` pair used by both envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: ErrorCode,
    pub message: String,
}

/// Outgoing reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

/// Either `result` or `error`, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePayload {
    Result(Value),
    Error(ErrorObject),
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: ResponsePayload::Result(result),
        }
    }

    pub fn error(id: Value, code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: ResponsePayload::Error(ErrorObject {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, ResponsePayload::Error(_))
    }

    /// The error object, if this is an error reply.
    pub fn error_object(&self) -> Option<&ErrorObject> {
        match &self.payload {
            ResponsePayload::Error(e) => Some(e),
            ResponsePayload::Result(_) => None,
        }
    }
}

/// Decode one downstream line.
///
/// Non-JSON input and a bare `null` are a [`DecodeError::Parse`]. Any other
/// JSON that is not an object, has the wrong protocol tag, or lacks a string
/// `method` is a [`DecodeError::InvalidRequest`] carrying the id found in
/// the message.
pub fn decode_request(line: &str) -> Result<JsonRpcRequest, DecodeError> {
    let value: Value =
        serde_json::from_str(line.trim()).map_err(|e| DecodeError::Parse(e.to_string()))?;

    if value.is_null() {
        return Err(DecodeError::Parse("request cannot be null".to_string()));
    }
    let Some(map) = value.as_object() else {
        return Err(DecodeError::InvalidRequest {
            id: Value::Null,
            message: "Request must be a JSON object".to_string(),
        });
    };

    let id = map.get("id").cloned().unwrap_or(Value::Null);
    if map.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(DecodeError::InvalidRequest {
            id,
            message: "Invalid JSON-RPC version".to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| DecodeError::InvalidRequest {
        id,
        message: format!("Invalid request: {e}"),
    })
}

/// Encode a reply as a single line (no trailing newline).
pub fn encode_response(response: &JsonRpcResponse) -> Result<String, serde_json::Error> {
    serde_json::to_string(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;
    use serde_json::json;

    #[test]
    fn decode_tools_call() {
        let req = decode_request(
            r#"{"jsonrpc":"2.0","id":"2","method":"tools/call","params":{"name":"get_project_info","arguments":{}}}"#,
        )
        .unwrap();
        assert_eq!(req.method, "tools/call");
        assert_eq!(req.id, Some(json!("2")));
        assert_eq!(req.params.unwrap()["name"], "get_project_info");
    }

    #[test]
    fn absent_id_is_notification_but_null_is_not() {
        let n = decode_request(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .unwrap();
        assert!(n.is_notification());

        let r = decode_request(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert!(!r.is_notification());
        assert_eq!(r.reply_id(), Value::Null);
    }

    #[test]
    fn garbage_is_parse_error_with_null_id() {
        let err = decode_request("{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Parse(_)));

        let reply = err.into_response().unwrap();
        assert_eq!(reply.id, Value::Null);
        assert_eq!(
            reply.error_object().unwrap().code,
            ErrorCode::from(codes::PARSE_ERROR)
        );
        assert!(reply.error_object().unwrap().message.starts_with("Invalid JSON: "));
    }

    #[test]
    fn wrong_version_keeps_id() {
        let err = decode_request(r#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#).unwrap_err();
        let reply = err.into_response().unwrap();
        assert_eq!(reply.id, json!(7));
        let e = reply.error_object().unwrap();
        assert_eq!(e.code, ErrorCode::from(codes::INVALID_REQUEST));
        assert_eq!(e.message, "Invalid JSON-RPC version");
    }

    #[test]
    fn missing_version_or_method_is_invalid() {
        assert!(matches!(
            decode_request(r#"{"id":1,"method":"ping"}"#),
            Err(DecodeError::InvalidRequest { .. })
        ));
        assert!(matches!(
            decode_request(r#"{"jsonrpc":"2.0","id":1}"#),
            Err(DecodeError::InvalidRequest { id, .. }) if id == json!(1)
        ));
        assert!(matches!(
            decode_request("[1,2]"),
            Err(DecodeError::InvalidRequest { id: Value::Null, .. })
        ));
    }

    #[test]
    fn bare_null_is_a_parse_error() {
        let err = decode_request("null").unwrap_err();
        assert!(matches!(err, DecodeError::Parse(_)));
        let reply = err.into_response().unwrap();
        assert_eq!(reply.id, Value::Null);
        let e = reply.error_object().unwrap();
        assert_eq!(e.code, ErrorCode::from(codes::PARSE_ERROR));
        assert_eq!(e.message, "Invalid JSON: request cannot be null");
    }

    #[test]
    fn encode_success_and_error() {
        let ok = JsonRpcResponse::success(json!("1"), json!({}));
        assert_eq!(
            encode_response(&ok).unwrap(),
            r#"{"jsonrpc":"2.0","id":"1","result":{}}"#
        );

        let err = JsonRpcResponse::error(json!(4), codes::METHOD_NOT_FOUND, "Unknown method: x");
        assert_eq!(
            encode_response(&err).unwrap(),
            r#"{"jsonrpc":"2.0","id":4,"error":{"code":"METHOD_NOT_FOUND","message":"Unknown method: x"}}"#
        );
    }

    #[test]
    fn numeric_remote_codes_pass_through() {
        let e: ErrorObject = serde_json::from_str(r#"{"code":-32000,"message":"boom"}"#).unwrap();
        assert_eq!(e.code, ErrorCode::Number(-32000));
        assert_eq!(e.code.to_string(), "-32000");
    }
}
