//! `subtract` tool definition.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::common::{OperandsParams, checked};
use crate::domains::tools::{ToolDefinition, ToolFailure};

/// Subtract tool - integer subtraction.
pub struct SubtractTool;

#[async_trait]
impl ToolDefinition for SubtractTool {
    const NAME: &'static str = "subtract";
    const DESCRIPTION: &'static str = "Subtract the second number from the first";
    const PURE: bool = true;
    type Params = OperandsParams;

    #[instrument(skip_all, fields(a = params.a, b = params.b))]
    async fn execute(&self, params: OperandsParams) -> Result<Value, ToolFailure> {
        debug!("subtract tool called");
        checked(Self::NAME, params, params.a.checked_sub(params.b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subtract_goes_negative() {
        let result = SubtractTool
            .execute(OperandsParams { a: 2, b: 5 })
            .await
            .unwrap();
        assert_eq!(result, json!(-3));
    }
}
