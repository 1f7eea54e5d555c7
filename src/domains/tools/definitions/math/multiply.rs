//! `multiply` tool definition.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::common::{OperandsParams, checked};
use crate::domains::tools::{ToolDefinition, ToolFailure};

/// Multiply tool - integer multiplication.
pub struct MultiplyTool;

#[async_trait]
impl ToolDefinition for MultiplyTool {
    const NAME: &'static str = "multiply";
    const DESCRIPTION: &'static str = "Multiply two numbers";
    const PURE: bool = true;
    type Params = OperandsParams;

    #[instrument(skip_all, fields(a = params.a, b = params.b))]
    async fn execute(&self, params: OperandsParams) -> Result<Value, ToolFailure> {
        debug!("multiply tool called");
        checked(Self::NAME, params, params.a.checked_mul(params.b))
    }
}
