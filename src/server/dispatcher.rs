//! Dispatcher - routes request envelopes to a provider's tools.
//!
//! Every request produces exactly one response with the request's id:
//!
//! | Situation | Response |
//! |---|---|
//! | not a request envelope | `-32600` |
//! | unknown method | `-32601` |
//! | bad `tools/call` params, unknown tool, schema or domain failure | `-32602` |
//! | tool defect or panic | `-32603`, generic message |
//!
//! Internal failures are logged with full detail but the response only ever
//! says "Internal error".

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{Value, json};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, instrument, warn};

use super::error::ProviderError;
use super::provider::Provider;
use crate::domains::tools::{ToolDescriptor, ToolFailure, ToolRegistry};
use crate::protocol::{
    Envelope, ErrorCode, ErrorObject, Inbound, ListToolsResult, Method, PROTOCOL_VERSION,
    ToolCallParams, decode,
};

/// Per-provider request router.
pub struct Dispatcher {
    name: String,
    version: String,
    tools: Arc<ToolRegistry>,
    request_count: AtomicU64,
}

impl Dispatcher {
    /// Create a dispatcher serving `tools` under `name`.
    pub fn new(name: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tools,
            request_count: AtomicU64::new(0),
        }
    }

    /// Override the version reported by `initialize`.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The tool registry this dispatcher serves.
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Number of requests received so far, including undecodable ones.
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Route a request envelope and produce its response.
    #[instrument(skip_all, fields(provider = %self.name, id = %request.id, method = %request.method))]
    pub async fn route(&self, request: Envelope) -> Envelope {
        self.request_count.fetch_add(1, Ordering::Relaxed);

        if !request.is_request() {
            warn!("Rejected non-request envelope");
            return Envelope::failure(
                &request,
                ErrorObject::new(ErrorCode::InvalidRequest, "Expected a request envelope"),
            );
        }

        let Some(method) = Method::parse(&request.method) else {
            warn!("Unknown method: {}", request.method);
            return Envelope::failure(
                &request,
                ErrorObject::from_code(ErrorCode::MethodNotFound)
                    .with_data(Value::String(request.method.clone())),
            );
        };

        let outcome = match method {
            Method::Initialize => Ok(self.initialize_result()),
            Method::Ping => Ok(json!({})),
            Method::ToolsList => Ok(self.list_result()),
            Method::ToolsCall => self.call_tool(&request).await,
        };

        match outcome {
            Ok(result) => Envelope::success(&request, result),
            Err(error) => Envelope::failure(&request, error),
        }
    }

    /// Decode raw text and route it.
    ///
    /// Returns `None` for notifications, which get no response.
    pub async fn handle_raw(&self, raw: &str) -> Option<Envelope> {
        match decode(raw) {
            Inbound::Request(request) => Some(self.route(request).await),
            Inbound::Notification(method) => {
                debug!("Received notification: {}", method);
                None
            }
            Inbound::Invalid(e) => {
                self.request_count.fetch_add(1, Ordering::Relaxed);
                warn!("Rejected inbound message: {}", e);
                Some(e.into_response())
            }
        }
    }

    fn initialize_result(&self) -> Value {
        info!("Processing initialize request");
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": self.name,
                "version": self.version
            }
        })
    }

    fn list_result(&self) -> Value {
        let result = ListToolsResult {
            tools: self.tools.list(),
        };
        debug!("Listing {} tools", result.tools.len());
        // A list of plain descriptors always serializes.
        serde_json::to_value(result).unwrap_or_else(|_| json!({ "tools": [] }))
    }

    async fn call_tool(&self, request: &Envelope) -> Result<Value, ErrorObject> {
        let params = request
            .params()
            .cloned()
            .ok_or_else(|| invalid_params("Missing params"))?;
        let params: ToolCallParams = serde_json::from_value(params)
            .map_err(|e| invalid_params(format!("Invalid tools/call params: {}", e)))?;

        let tool = self
            .tools
            .resolve(&params.name)
            .ok_or_else(|| invalid_params(format!("Unknown tool: {}", params.name)))?;

        let arguments = params.arguments.unwrap_or_default();
        tool.descriptor
            .input_schema
            .validate(&arguments)
            .map_err(invalid_params)?;

        info!("Calling tool: {}", params.name);
        let execution = AssertUnwindSafe(tool.handler.execute(arguments))
            .catch_unwind()
            .await;

        match execution {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(ToolFailure::InvalidParams(message))) => {
                info!("Tool {} rejected its arguments: {}", params.name, message);
                Err(invalid_params(message))
            }
            Ok(Err(ToolFailure::Internal(e))) => {
                error!("Tool {} failed: {:#}", params.name, e);
                Err(ErrorObject::from_code(ErrorCode::InternalError))
            }
            Err(panic) => {
                error!("Tool {} panicked: {}", params.name, panic_message(&*panic));
                Err(ErrorObject::from_code(ErrorCode::InternalError))
            }
        }
    }
}

fn invalid_params(message: impl Into<String>) -> ErrorObject {
    ErrorObject::new(ErrorCode::InvalidParams, message)
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[async_trait]
impl Provider for Dispatcher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle_request(&self, request: Envelope) -> Result<Envelope, ProviderError> {
        Ok(self.route(request).await)
    }

    async fn list_capabilities(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        Ok(self.tools.list())
    }
}
