//! Tool dispatch core.
//!
//! Routes structured tool invocations from a caller to tool providers and
//! back, over a JSON-RPC 2.0 style envelope.
//!
//! # Architecture
//!
//! - **protocol**: the envelope, error codes and request kinds
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: descriptors, the tool registry and built-in tools
//! - **server**: the provider abstraction, the dispatcher and the server registry
//! - **client**: the bridge, correlation state, connection pool, result cache
//!   and the TCP remote provider
//! - **core**: configuration, the unified error type and transports
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use tool_dispatch::client::{Bridge, ToolCall};
//! use tool_dispatch::domains::tools::definitions::math_tools;
//! use tool_dispatch::server::Dispatcher;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = Arc::new(Dispatcher::new("math", Arc::new(math_tools()?)));
//!     let bridge = Bridge::builder().provider(provider).build().await?;
//!
//!     let arguments = json!({ "a": 15, "b": 25 }).as_object().cloned().unwrap_or_default();
//!     let sum = bridge.invoke(ToolCall::new("add", arguments)).await?;
//!     assert_eq!(sum.result, json!(40));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod core;
pub mod domains;
pub mod protocol;
pub mod server;

// Re-export commonly used types for convenience
pub use client::{Bridge, ToolCall, ToolInvocation};
pub use crate::core::{Config, Error, Result};
pub use protocol::{Envelope, ErrorCode};
pub use server::{Dispatcher, Provider, ServerRegistry};
