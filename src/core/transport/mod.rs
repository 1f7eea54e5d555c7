//! Transport layer serving a dispatcher.
//!
//! This module provides different transport implementations:
//! - **STDIO**: line-delimited envelopes over stdin/stdout - feature: `stdio`
//! - **TCP**: line-delimited envelopes over a TCP socket - feature: `tcp`
//! - **HTTP**: one envelope per POST request - feature: `http`
//!
//! Each transport handles the connection lifecycle and delegates every
//! message to [`Dispatcher::handle_raw`](crate::server::Dispatcher::handle_raw).
//!
//! # Feature Flags
//!
//! - `stdio` (default): STDIO transport - minimal dependencies
//! - `tcp` (default): TCP transport - adds tokio/net
//! - `http`: HTTP transport - adds axum, tower, tower-http

mod config;
mod error;
mod service;

#[cfg(any(feature = "stdio", feature = "tcp"))]
pub mod lines;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

// Re-export configs for convenience
#[cfg(feature = "tcp")]
pub use config::TcpConfig;

#[cfg(feature = "http")]
pub use config::HttpConfig;
