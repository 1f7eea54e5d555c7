//! Domains module containing business logic organized by bounded contexts.
//!
//! Tools are the only domain: descriptors, the per-provider registry and the
//! built-in tool definitions.

pub mod tools;
