//! HTTP transport implementation.
//!
//! One envelope per POST to the configured RPC path. The body is handed to
//! the dispatcher as raw text, so malformed JSON gets the same `-32700`
//! response it would get on any other transport.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use http::StatusCode;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, instrument};

use super::{TransportConfig, TransportError, TransportResult, config::HttpConfig};
use crate::server::Dispatcher;

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
    rpc_path: String,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Create from TransportConfig (extracts HTTP config).
    pub fn from_transport_config(config: &TransportConfig) -> Option<Self> {
        match config {
            TransportConfig::Http(http_config) => Some(Self::new(http_config.clone())),
            _ => None,
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the router without binding.
    pub fn router(&self, dispatcher: Arc<Dispatcher>) -> Router {
        let state = AppState {
            dispatcher,
            rpc_path: self.config.rpc_path.clone(),
        };

        let app = Router::new()
            .route(&self.config.rpc_path, post(handle_rpc))
            .route("/health", get(health_check))
            .route("/", get(root_handler))
            .with_state(state);

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app.layer(cors)
        } else {
            app
        }
    }

    /// Run the HTTP transport.
    pub async fn run(self, dispatcher: Arc<Dispatcher>) -> TransportResult<()> {
        let addr = self.address();
        let app = self.router(dispatcher);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON envelopes over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → RPC:    POST {}", self.config.rpc_path);
        info!("  → Health: GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.dispatcher.name(),
        "version": state.dispatcher.version(),
        "transport": "HTTP",
        "endpoints": {
            "rpc": state.rpc_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "tools": state.dispatcher.tools().names()
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "requests": state.dispatcher.request_count(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Handle one envelope.
#[instrument(skip_all, fields(bytes = body.len()))]
async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Response {
    let raw = String::from_utf8_lossy(&body);
    match state.dispatcher.handle_raw(&raw).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => {
            debug!("Notification accepted");
            StatusCode::ACCEPTED.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::math_tools;
    use axum::body::Body;
    use http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn router() -> Router {
        let dispatcher = Arc::new(Dispatcher::new("math", Arc::new(math_tools().unwrap())));
        HttpTransport::new(HttpConfig::default()).router(dispatcher)
    }

    async fn post_rpc(body: &str) -> (StatusCode, Option<Value>) {
        let response = router()
            .oneshot(
                Request::post("/mcp")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&bytes).unwrap())
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_tool_call() {
        let (status, body) = post_rpc(
            r#"{"jsonrpc":"2.0","id":"h1","method":"tools/call","params":{"name":"subtract","arguments":{"a":10,"b":4}}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(body["id"], "h1");
        assert_eq!(body["result"], 6);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (status, body) = post_rpc("{oops").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_notification_has_no_body() {
        let (status, body) =
            post_rpc(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
