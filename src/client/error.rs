//! Caller-facing error types.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::protocol::ErrorCode;
use crate::server::ProviderError;

/// Failures surfaced to a bridge caller.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The provider answered with an error envelope; code and message are
    /// carried through unchanged.
    #[error("{message} (code {code})")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// The response violated the envelope discipline (id mismatch, a request
    /// where a response was expected).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No provider is registered under this name.
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// The bridge routes through a registry but the call named no provider.
    #[error("No provider specified for tool {0}")]
    MissingProvider(String),

    /// The caller's deadline passed before a response arrived.
    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    /// The provider could not be reached.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The bridge was configured inconsistently.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The wire error code, for errors that came back from a provider.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Rpc { code, .. } => ErrorCode::from_code(*code),
            _ => None,
        }
    }
}

/// Connection pool errors.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No connection became available before the deadline.
    #[error("Timed out after {0:?} waiting for a connection")]
    Timeout(Duration),

    /// The pool has been closed.
    #[error("Connection pool is closed")]
    Closed,

    /// Opening a new connection failed.
    #[error("Failed to connect: {0}")]
    Connect(String),
}

impl PoolError {
    /// Create a connect error.
    pub fn connect(msg: impl Into<String>) -> Self {
        Self::Connect(msg.into())
    }
}
