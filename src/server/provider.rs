//! The provider abstraction.

use async_trait::async_trait;

use super::error::ProviderError;
use crate::domains::tools::ToolDescriptor;
use crate::protocol::Envelope;

/// A component that exposes a capability set and executes tool calls.
///
/// `handle_request` must answer every request with exactly one response
/// envelope whose id equals the request id. `Err` is reserved for failures to
/// reach the provider at all; request-level failures travel inside the
/// response envelope.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Name under which the provider is registered.
    fn name(&self) -> &str;

    /// Answer one request envelope.
    async fn handle_request(&self, request: Envelope) -> Result<Envelope, ProviderError>;

    /// Current capability set.
    async fn list_capabilities(&self) -> Result<Vec<ToolDescriptor>, ProviderError>;
}
