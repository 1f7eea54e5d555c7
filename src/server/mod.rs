//! Provider side of the dispatch core.
//!
//! - `provider.rs` - the `Provider` abstraction every tool server implements
//! - `dispatcher.rs` - routes request envelopes to tools and enforces the error taxonomy
//! - `registry.rs` - name to provider map used when more than one provider exists
//! - `error.rs` - provider and registry errors

mod dispatcher;
mod error;
mod provider;
mod registry;

pub use dispatcher::Dispatcher;
pub use error::{ProviderError, RegistryError};
pub use provider::Provider;
pub use registry::ServerRegistry;
