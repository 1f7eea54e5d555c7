//! `add` tool definition.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::common::{OperandsParams, checked};
use crate::domains::tools::{ToolDefinition, ToolFailure};

/// Add tool - integer addition.
pub struct AddTool;

#[async_trait]
impl ToolDefinition for AddTool {
    const NAME: &'static str = "add";
    const DESCRIPTION: &'static str = "Add two numbers";
    const PURE: bool = true;
    type Params = OperandsParams;

    #[instrument(skip_all, fields(a = params.a, b = params.b))]
    async fn execute(&self, params: OperandsParams) -> Result<Value, ToolFailure> {
        debug!("add tool called");
        checked(Self::NAME, params, params.a.checked_add(params.b))
    }
}
