//! `search_web` tool definition.
//!
//! Stands in for a real search backend; the result is a placeholder string.
//! Not pure, so its results are never cached.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::domains::tools::{ToolDefinition, ToolFailure};

/// Parameters for the web search tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchWebParams {
    /// Search query.
    pub query: String,
}

/// Web search tool.
pub struct SearchWebTool;

#[async_trait]
impl ToolDefinition for SearchWebTool {
    const NAME: &'static str = "search_web";
    const DESCRIPTION: &'static str = "Search the web for information";
    type Params = SearchWebParams;

    #[instrument(skip_all, fields(query = %params.query))]
    async fn execute(&self, params: SearchWebParams) -> Result<Value, ToolFailure> {
        if params.query.trim().is_empty() {
            return Err(ToolFailure::invalid_params("query must not be empty"));
        }

        info!("Web search requested");
        Ok(Value::String(format!(
            "Search results for '{}': [Placeholder for web search results]",
            params.query
        )))
    }
}
