//! Raw text decoding for transports.
//!
//! Transports hand the dispatcher raw JSON text. Decoding distinguishes
//! malformed JSON (`-32700`), JSON that is not a request envelope (`-32600`)
//! and notifications, which never get a response.

use serde_json::Value;
use thiserror::Error;

use super::codes::ErrorCode;
use super::envelope::{Envelope, ErrorObject};

/// Outcome of decoding one inbound message.
#[derive(Debug)]
pub enum Inbound {
    /// A conformant request envelope.
    Request(Envelope),
    /// A message without an id whose method is a notification; carries the method.
    Notification(String),
    /// Anything else; must be answered with an error response.
    Invalid(DecodeError),
}

/// Why an inbound message could not be accepted as a request.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid request: {reason}")]
    Invalid {
        id: String,
        method: String,
        reason: String,
    },
}

impl DecodeError {
    /// Wire code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::ParseError,
            Self::Invalid { .. } => ErrorCode::InvalidRequest,
        }
    }

    /// Error response for this failure. The id is the salvaged request id,
    /// or empty when none could be read.
    pub fn into_response(self) -> Envelope {
        let code = self.code();
        match self {
            Self::Parse(_) => Envelope::failure_for("", "", ErrorObject::from_code(code)),
            Self::Invalid { id, method, reason } => Envelope::failure_for(
                id,
                method,
                ErrorObject::from_code(code).with_data(Value::String(reason)),
            ),
        }
    }
}

/// Decode one inbound message.
pub fn decode(raw: &str) -> Inbound {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return Inbound::Invalid(DecodeError::Parse(e)),
    };

    let id = value.get("id").and_then(Value::as_str).map(str::to_string);
    let method = value
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if value.get("id").is_none() && method.starts_with("notifications/") {
        return Inbound::Notification(method);
    }

    match serde_json::from_value::<Envelope>(value) {
        Ok(envelope) if envelope.is_request() => Inbound::Request(envelope),
        Ok(envelope) => Inbound::Invalid(DecodeError::Invalid {
            id: envelope.id,
            method: envelope.method,
            reason: "expected a request envelope, received a response".to_string(),
        }),
        Err(e) => Inbound::Invalid(DecodeError::Invalid {
            id: id.unwrap_or_default(),
            method,
            reason: e.to_string(),
        }),
    }
}

/// Encode an envelope as a single line of JSON text.
pub fn encode(envelope: &Envelope) -> serde_json::Result<String> {
    serde_json::to_string(envelope)
}
