//! Provider and server registry error types.

use thiserror::Error;

use crate::client::PoolError;

/// Failures reaching a provider. An in-process dispatcher never fails; these
/// come from out-of-process providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No pooled connection could be obtained.
    #[error("Connection pool error: {0}")]
    Pool(#[from] PoolError),

    /// The connection to the provider failed or closed mid-request.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The provider answered with something that is not a valid envelope.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl ProviderError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

/// Errors raised by the server registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A provider with this name is already registered.
    #[error("Duplicate provider: {0}")]
    DuplicateProvider(String),

    /// No provider is registered under this name.
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// The provider was found but the request could not be delivered.
    #[error("Provider {name} failed: {source}")]
    Provider {
        name: String,
        #[source]
        source: ProviderError,
    },
}
