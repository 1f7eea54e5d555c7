//! Common params and helpers shared across the arithmetic tools.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domains::tools::ToolFailure;

/// Two integer operands.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct OperandsParams {
    /// First operand.
    pub a: i64,
    /// Second operand.
    pub b: i64,
}

/// Turn a checked arithmetic result into a tool result.
pub fn checked(operation: &str, params: OperandsParams, result: Option<i64>) -> Result<Value, ToolFailure> {
    match result {
        Some(value) => Ok(Value::from(value)),
        None => {
            warn!("{} overflowed for a={} b={}", operation, params.a, params.b);
            Err(ToolFailure::invalid_params(format!(
                "{} of {} and {} overflows a 64-bit integer",
                operation, params.a, params.b
            )))
        }
    }
}
