//! Tools domain module.
//!
//! This module handles everything a provider knows about its tools:
//! descriptors and schemas, the implementation boundary, the per-provider
//! registry and the built-in tool definitions.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `descriptor.rs` - Tool descriptors and structural input schemas
//! - `handler.rs` - `ToolHandler` / `ToolDefinition` traits
//! - `registry.rs` - Per-provider tool registry
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` (e.g., `my_tool.rs`)
//! 2. Define a params struct and implement `ToolDefinition`
//! 3. Export in `definitions/mod.rs`
//! 4. Register it with `ToolRegistry::register_definition`

pub mod definitions;
mod descriptor;
mod error;
mod handler;
mod registry;

pub use descriptor::{InputSchema, PrimitiveType, PropertySchema, ToolAnnotations, ToolDescriptor};
pub use error::{ToolError, ToolFailure};
pub use handler::{FnTool, ToolDefinition, ToolHandler, Typed};
pub use registry::{RegisteredTool, ToolRegistry};
