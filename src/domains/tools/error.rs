//! Tool-specific error types.

use thiserror::Error;

/// Configuration-time errors raised by the tool registry.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A tool with this name is already registered.
    #[error("Duplicate tool: {0}")]
    Duplicate(String),

    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The descriptor's input schema is not well formed.
    #[error("Invalid schema for tool {tool}: {reason}")]
    InvalidSchema { tool: String, reason: String },
}

impl ToolError {
    /// Create a new "duplicate" error.
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::Duplicate(name.into())
    }

    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid schema" error.
    pub fn invalid_schema(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Failure returned by a tool implementation.
///
/// `InvalidParams` covers missing or malformed arguments and business-rule
/// violations; its message is shown to the caller. `Internal` covers defects;
/// its detail is logged and never leaves the provider.
#[derive(Debug, Error)]
pub enum ToolFailure {
    #[error("{0}")]
    InvalidParams(String),

    #[error("internal tool failure: {0:#}")]
    Internal(anyhow::Error),
}

impl ToolFailure {
    /// Create a domain / validation failure.
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// Create an internal failure.
    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        Self::Internal(error.into())
    }
}

impl From<anyhow::Error> for ToolFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(error)
    }
}
