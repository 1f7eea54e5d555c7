//! Wire protocol for the dispatch core.
//!
//! Everything exchanged between a caller-side [`Bridge`](crate::client::Bridge)
//! and a [`Provider`](crate::server::Provider) is an [`Envelope`]. This module
//! owns the envelope shape, the error code table and the closed set of
//! request kinds.

mod codec;
mod codes;
mod envelope;
mod method;

pub use codec::{DecodeError, Inbound, decode, encode};
pub use codes::ErrorCode;
pub use envelope::{
    Envelope, EnvelopeError, ErrorObject, JSONRPC_VERSION, ListToolsResult, PROTOCOL_VERSION,
    Payload, ToolCallParams,
};
pub use method::Method;
