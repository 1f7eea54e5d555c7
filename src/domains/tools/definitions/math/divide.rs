//! `divide` tool definition.
//!
//! The only arithmetic tool with a business rule: the divisor must not be
//! zero. That is a domain error, reported as invalid params rather than an
//! internal failure.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{instrument, warn};

use super::common::OperandsParams;
use crate::domains::tools::{ToolDefinition, ToolFailure};

/// Divide tool - floating point quotient of two integers.
pub struct DivideTool;

#[async_trait]
impl ToolDefinition for DivideTool {
    const NAME: &'static str = "divide";
    const DESCRIPTION: &'static str = "Divide the first number by the second";
    const PURE: bool = true;
    type Params = OperandsParams;

    #[instrument(skip_all, fields(a = params.a, b = params.b))]
    async fn execute(&self, params: OperandsParams) -> Result<Value, ToolFailure> {
        if params.b == 0 {
            warn!("Rejected division by zero");
            return Err(ToolFailure::invalid_params("Cannot divide by zero"));
        }

        let quotient = params.a as f64 / params.b as f64;
        serde_json::Number::from_f64(quotient)
            .map(Value::Number)
            .ok_or_else(|| ToolFailure::internal(anyhow::anyhow!("non-finite quotient {}", quotient)))
    }
}
