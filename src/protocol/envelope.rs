//! The message envelope and the method-specific payload shapes.
//!
//! An [`Envelope`] is either a request or a response. The distinction lives in
//! [`Payload`], so a response can never carry both a result and an error, and
//! can never carry neither. On the wire the envelope is a flat JSON object:
//!
//! ```json
//! { "id": "b1:7", "jsonrpc": "2.0", "method": "tools/call",
//!   "params": { "name": "add", "arguments": { "a": 1, "b": 2 } } }
//! ```
//!
//! A present `"result": null` is a success whose value is null; an absent
//! `result` together with an absent `error` is a request.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::codes::ErrorCode;
use crate::domains::tools::ToolDescriptor;

/// Fixed protocol version tag.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Structured error carried by an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    /// Create an error with an explicit message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Create an error with the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.message())
    }

    /// Attach structured data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The known code, if this error uses one from the table.
    pub fn kind(&self) -> Option<ErrorCode> {
        ErrorCode::from_code(self.code)
    }
}

/// What an envelope carries besides its id and method.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// An outbound request with optional method-specific params.
    Request { params: Option<Value> },
    /// A successful response.
    Success(Value),
    /// A failed response.
    Failure(ErrorObject),
}

/// The single request/response unit exchanged between bridge and provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub struct Envelope {
    /// Correlation id, unique among in-flight requests of its issuer.
    pub id: String,
    /// Requested operation; responses echo the request's method.
    pub method: String,
    pub payload: Payload,
}

impl Envelope {
    /// Build a request envelope.
    pub fn request(id: impl Into<String>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            payload: Payload::Request { params },
        }
    }

    /// Build a success response answering `request`.
    pub fn success(request: &Envelope, result: Value) -> Self {
        Self {
            id: request.id.clone(),
            method: request.method.clone(),
            payload: Payload::Success(result),
        }
    }

    /// Build an error response answering `request`.
    pub fn failure(request: &Envelope, error: ErrorObject) -> Self {
        Self::failure_for(request.id.clone(), request.method.clone(), error)
    }

    /// Build an error response from raw identity, for requests that never
    /// decoded into an envelope.
    pub fn failure_for(id: impl Into<String>, method: impl Into<String>, error: ErrorObject) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            payload: Payload::Failure(error),
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self.payload, Payload::Request { .. })
    }

    pub fn is_response(&self) -> bool {
        !self.is_request()
    }

    /// Request params, if this is a request that carries any.
    pub fn params(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Request { params } => params.as_ref(),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorObject> {
        match &self.payload {
            Payload::Failure(error) => Some(error),
            _ => None,
        }
    }
}

/// Reasons a well-formed JSON object is not a conformant envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("unsupported jsonrpc version: {0:?}")]
    UnsupportedVersion(String),

    #[error("request envelope has no method")]
    MissingMethod,

    #[error("envelope carries both result and error")]
    ResultAndError,

    #[error("params must be an object")]
    ParamsNotObject,
}

/// Field-exact wire representation.
#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    id: String,
    jsonrpc: String,
    #[serde(default)]
    method: String,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    params: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorObject>,
}

/// Maps a present field to `Some`, including a literal `null`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = EnvelopeError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        if wire.jsonrpc != JSONRPC_VERSION {
            return Err(EnvelopeError::UnsupportedVersion(wire.jsonrpc));
        }

        // Peers that write every field send `"result": null` on requests too;
        // a present `params` key, even a null one, marks those as requests.
        let result = match wire.result {
            Some(Value::Null) if wire.params.is_some() => None,
            other => other,
        };
        let params = wire.params.filter(|params| !params.is_null());

        let payload = match (result, wire.error) {
            (Some(_), Some(_)) => return Err(EnvelopeError::ResultAndError),
            (None, Some(error)) => Payload::Failure(error),
            (Some(result), None) => Payload::Success(result),
            (None, None) => {
                if wire.method.is_empty() {
                    return Err(EnvelopeError::MissingMethod);
                }
                if params.as_ref().is_some_and(|p| !p.is_object()) {
                    return Err(EnvelopeError::ParamsNotObject);
                }
                Payload::Request { params }
            }
        };

        Ok(Self {
            id: wire.id,
            method: wire.method,
            payload,
        })
    }
}

impl From<Envelope> for WireEnvelope {
    fn from(envelope: Envelope) -> Self {
        let (params, result, error) = match envelope.payload {
            Payload::Request { params } => (params, None, None),
            Payload::Success(result) => (None, Some(result), None),
            Payload::Failure(error) => (None, None, Some(error)),
        };

        Self {
            id: envelope.id,
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: envelope.method,
            params,
            result,
            error,
        }
    }
}

/// `params` of a `tools/call` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
}

/// `result` of a `tools/list` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = Envelope::request(
            "b:1",
            "tools/call",
            Some(json!({ "name": "add", "arguments": { "a": 1, "b": 2 } })),
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["id"], "b:1");
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "tools/call");
        assert_eq!(value["params"]["name"], "add");
        assert!(value.get("result").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_null_result_is_a_success() {
        let envelope: Envelope = serde_json::from_value(json!({
            "id": "1", "jsonrpc": "2.0", "method": "ping", "result": null
        }))
        .unwrap();

        assert_eq!(envelope.payload, Payload::Success(Value::Null));
        let back = serde_json::to_value(&envelope).unwrap();
        assert_eq!(back["result"], Value::Null);
        assert!(back.as_object().unwrap().contains_key("result"));
    }

    #[test]
    fn test_error_response_decodes() {
        let envelope: Envelope = serde_json::from_value(json!({
            "id": "7", "jsonrpc": "2.0", "method": "tools/call",
            "result": null,
            "error": null
        }))
        .unwrap();
        // `error: null` is absent, so a present null result wins.
        assert!(envelope.result().is_some());

        let envelope: Envelope = serde_json::from_value(json!({
            "id": "7", "jsonrpc": "2.0", "method": "tools/call",
            "error": { "code": -32601, "message": "Method not found" }
        }))
        .unwrap();
        assert_eq!(
            envelope.error().and_then(ErrorObject::kind),
            Some(ErrorCode::MethodNotFound)
        );
    }

    #[test]
    fn test_fully_populated_request_decodes_as_request() {
        let envelope: Envelope = serde_json::from_value(json!({
            "id": "3", "jsonrpc": "2.0", "method": "tools/call",
            "params": { "name": "add", "arguments": { "a": 1, "b": 2 } },
            "result": null,
            "error": null
        }))
        .unwrap();
        assert!(envelope.is_request());
        assert_eq!(envelope.params().unwrap()["name"], "add");

        let envelope: Envelope = serde_json::from_value(json!({
            "id": "1", "jsonrpc": "2.0", "method": "tools/list",
            "params": null,
            "result": null,
            "error": null
        }))
        .unwrap();
        assert!(envelope.is_request());
        assert!(envelope.params().is_none());
    }

    #[test]
    fn test_result_and_error_rejected() {
        let result = serde_json::from_value::<Envelope>(json!({
            "id": "1", "jsonrpc": "2.0", "method": "tools/call",
            "result": 1,
            "error": { "code": -32603, "message": "Internal error" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_version_rejected() {
        let result = serde_json::from_value::<Envelope>(json!({
            "id": "1", "jsonrpc": "1.0", "method": "ping"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_request_without_method_rejected() {
        let result = serde_json::from_value::<Envelope>(json!({
            "id": "1", "jsonrpc": "2.0"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_object_params_rejected() {
        let result = serde_json::from_value::<Envelope>(json!({
            "id": "1", "jsonrpc": "2.0", "method": "tools/call", "params": [1, 2]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_keeps_request_identity() {
        let request = Envelope::request("abc", "tools/list", None);
        let response = Envelope::success(&request, json!({ "tools": [] }));
        assert_eq!(response.id, "abc");
        assert_eq!(response.method, "tools/list");
        assert!(response.is_response());

        let failure = Envelope::failure(&request, ErrorObject::from_code(ErrorCode::InternalError));
        assert_eq!(failure.id, "abc");
        assert!(failure.result().is_none());
        assert_eq!(failure.error().unwrap().message, "Internal error");
    }

    #[test]
    fn test_tool_call_params_arguments_optional() {
        let params: ToolCallParams = serde_json::from_value(json!({ "name": "add" })).unwrap();
        assert_eq!(params.name, "add");
        assert!(params.arguments.is_none());

        let params: ToolCallParams =
            serde_json::from_value(json!({ "name": "add", "arguments": null })).unwrap();
        assert!(params.arguments.is_none());

        let bad = serde_json::from_value::<ToolCallParams>(json!({ "name": "add", "arguments": 3 }));
        assert!(bad.is_err());
    }
}
