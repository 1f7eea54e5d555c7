//! Core module containing shared infrastructure components.
//!
//! Configuration, the unified error type and the transports that expose a
//! dispatcher to the outside world.

pub mod config;
pub mod error;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use transport::{TransportConfig, TransportService};
