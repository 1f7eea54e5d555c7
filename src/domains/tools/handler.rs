//! Tool implementation boundary.
//!
//! A tool is an opaque function from validated arguments to a result or a
//! [`ToolFailure`]. There are two ways to provide one:
//!
//! - implement [`ToolDefinition`] on a type with a typed params struct; the
//!   input schema is derived from the params type and arguments are
//!   deserialized before `execute` runs
//! - wrap a closure in [`FnTool`] and supply the descriptor by hand

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::future::Future;

use super::descriptor::{InputSchema, ToolDescriptor};
use super::error::{ToolError, ToolFailure};

/// Dynamic tool interface used by the dispatcher.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with schema-validated arguments.
    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolFailure>;
}

/// A tool with a typed params struct.
#[async_trait]
pub trait ToolDefinition: Send + Sync + 'static {
    /// Tool name as registered.
    const NAME: &'static str;

    /// Tool description shown to clients.
    const DESCRIPTION: &'static str;

    /// Side-effect free and deterministic, so results may be cached.
    const PURE: bool = false;

    /// Argument type; its JSON schema becomes the tool's input schema.
    type Params: DeserializeOwned + JsonSchema + Send;

    /// Execute the tool logic.
    async fn execute(&self, params: Self::Params) -> Result<Value, ToolFailure>;

    /// Build the descriptor advertised for this tool.
    fn descriptor() -> Result<ToolDescriptor, ToolError>
    where
        Self: Sized,
    {
        let schema = InputSchema::for_type::<Self::Params>(Self::NAME)?;
        let descriptor = ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, schema);
        Ok(if Self::PURE {
            descriptor.pure()
        } else {
            descriptor
        })
    }
}

/// Adapter from a [`ToolDefinition`] to a [`ToolHandler`].
pub struct Typed<T>(pub T);

#[async_trait]
impl<T: ToolDefinition> ToolHandler for Typed<T> {
    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolFailure> {
        let params: T::Params = serde_json::from_value(Value::Object(arguments))
            .map_err(|e| ToolFailure::invalid_params(format!("invalid arguments: {}", e)))?;
        self.0.execute(params).await
    }
}

/// A closure-backed tool.
pub struct FnTool<F>(pub F);

#[async_trait]
impl<F, Fut> ToolHandler for FnTool<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolFailure>> + Send,
{
    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolFailure> {
        (self.0)(arguments).await
    }
}
