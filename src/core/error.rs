//! Unified error type.
//!
//! Each component keeps its own error enum; this type collects them for
//! code that spans components, such as the binary's startup path.

use thiserror::Error;

/// A specialized Result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Tool registration failed.
    #[error("Tool error: {0}")]
    Tool(#[from] crate::domains::tools::ToolError),

    /// Provider registration or routing failed.
    #[error("Registry error: {0}")]
    Registry(#[from] crate::server::RegistryError),

    /// A provider could not handle a request.
    #[error("Provider error: {0}")]
    Provider(#[from] crate::server::ProviderError),

    /// A pooled connection could not be acquired.
    #[error("Pool error: {0}")]
    Pool(#[from] crate::client::PoolError),

    /// A bridged call failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] crate::client::BridgeError),

    /// The transport could not serve.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from file operations or network communication.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
