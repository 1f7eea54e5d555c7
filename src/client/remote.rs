//! Remote provider - a [`Provider`] living in another process, reached over
//! TCP with line-delimited envelopes.
//!
//! Each [`Connection`] owns a reader task that routes responses to their
//! waiters by id and a writer task that serializes outbound lines, so
//! responses may arrive in any order and a caller abandoning a request can
//! never tear a half-written line.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::correlation::PendingRequests;
use super::error::PoolError;
use super::pool::{ConnectionPool, Connector};
use crate::core::config::PoolConfig;
use crate::domains::tools::ToolDescriptor;
use crate::protocol::{Envelope, ListToolsResult, Method, Payload, encode};
use crate::server::{Provider, ProviderError};

/// One TCP connection to a provider, shareable by concurrent requests.
pub struct Connection {
    outbound: mpsc::UnboundedSender<String>,
    pending: Arc<PendingRequests>,
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    /// Connect to `addr`.
    pub async fn open(addr: &str) -> Result<Self, PoolError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| PoolError::connect(format!("{}: {}", addr, e)))?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
        }
        debug!("Connected to {}", addr);

        let (read_half, write_half) = stream.into_split();
        let pending = PendingRequests::new();
        let closed = Arc::new(AtomicBool::new(false));
        let (outbound, rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(read_responses(
            read_half,
            Arc::clone(&pending),
            Arc::clone(&closed),
        ));
        let writer = tokio::spawn(write_requests(write_half, rx, Arc::clone(&closed)));

        Ok(Self {
            outbound,
            pending,
            closed,
            reader,
            writer,
        })
    }

    /// Send `request` and wait for its response.
    ///
    /// When this is the only request in flight, a response carrying an
    /// unknown id is returned as is and the caller checks the id.
    ///
    /// Dropping the returned future abandons the request; a response that
    /// arrives afterwards is discarded.
    pub async fn call(&self, request: Envelope) -> Result<Envelope, ProviderError> {
        if self.is_closed() {
            return Err(ProviderError::connection("connection is closed"));
        }

        let waiter = self.pending.register(&request.id).ok_or_else(|| {
            ProviderError::protocol(format!("request id `{}` is already in flight", request.id))
        })?;

        let line = encode(&request).map_err(|e| ProviderError::protocol(e.to_string()))?;
        self.outbound
            .send(line)
            .map_err(|_| ProviderError::connection("connection is closed"))?;

        waiter
            .wait()
            .await
            .map_err(|_| ProviderError::connection("connection closed before the response arrived"))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Requests sent on this connection still awaiting a response.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

async fn read_responses(read_half: OwnedReadHalf, pending: Arc<PendingRequests>, closed: Arc<AtomicBool>) {
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match serde_json::from_str::<Envelope>(&line) {
                Ok(response) if response.is_response() => {
                    pending.complete(response);
                }
                Ok(request) => warn!("Ignoring request {} sent by the provider", request.id),
                Err(e) => warn!("Ignoring undecodable line from the provider: {}", e),
            },
            Ok(None) => {
                debug!("Provider closed the connection");
                break;
            }
            Err(e) => {
                warn!("Connection read failed: {}", e);
                break;
            }
        }
    }
    closed.store(true, Ordering::Release);
    pending.fail_all();
}

async fn write_requests(
    mut write_half: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
) {
    while let Some(line) = rx.recv().await {
        let written = async {
            write_half.write_all(line.as_bytes()).await?;
            write_half.write_all(b"\n").await?;
            write_half.flush().await
        };
        if let Err(e) = written.await {
            warn!("Connection write failed: {}", e);
            closed.store(true, Ordering::Release);
            break;
        }
    }
}

/// Opens [`Connection`]s to one address.
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Connection = Connection;

    async fn connect(&self) -> Result<Connection, PoolError> {
        Connection::open(&self.addr).await
    }

    fn is_healthy(&self, connection: &Connection) -> bool {
        !connection.is_closed()
    }
}

/// A provider served by another process.
pub struct RemoteProvider {
    name: String,
    pool: ConnectionPool<TcpConnector>,
    seq: AtomicU64,
}

impl RemoteProvider {
    pub fn new(name: impl Into<String>, pool: ConnectionPool<TcpConnector>) -> Self {
        Self {
            name: name.into(),
            pool,
            seq: AtomicU64::new(0),
        }
    }

    /// A provider at `addr` with a pool sized by `config`.
    pub fn connect(name: impl Into<String>, addr: impl Into<String>, config: &PoolConfig) -> Self {
        let name = name.into();
        let addr = addr.into();
        info!(
            "Remote provider {} at {} (max {} connections)",
            name, addr, config.max_connections
        );

        let mut pool = ConnectionPool::new(TcpConnector::new(addr), config.max_connections);
        if let Some(timeout) = config.acquire_timeout() {
            pool = pool.with_acquire_timeout(timeout);
        }
        Self::new(name, pool)
    }

    pub fn pool(&self) -> &ConnectionPool<TcpConnector> {
        &self.pool
    }
}

#[async_trait]
impl Provider for RemoteProvider {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(provider = %self.name, id = %request.id))]
    async fn handle_request(&self, request: Envelope) -> Result<Envelope, ProviderError> {
        let connection = self.pool.acquire().await?;
        let response = connection.call(request).await;
        connection.release();
        response
    }

    async fn list_capabilities(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let request = Envelope::request(
            format!("{}#list-{}", self.name, seq),
            Method::ToolsList.as_str(),
            None,
        );

        let id = request.id.clone();
        let response = self.handle_request(request).await?;
        if response.id != id {
            return Err(ProviderError::protocol(format!(
                "response id `{}` does not match request id `{}`",
                response.id, id
            )));
        }
        match response.payload {
            Payload::Success(result) => serde_json::from_value::<ListToolsResult>(result)
                .map(|listing| listing.tools)
                .map_err(|e| ProviderError::protocol(format!("invalid tools/list result: {}", e))),
            Payload::Failure(error) => Err(ProviderError::protocol(format!(
                "tools/list failed: {} (code {})",
                error.message, error.code
            ))),
            Payload::Request { .. } => Err(ProviderError::protocol("expected a tools/list response")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Bridge, BridgeError, ToolCall};
    use crate::core::transport::tcp::TcpTransport;
    use crate::domains::tools::definitions::math_tools;
    use crate::domains::tools::{FnTool, InputSchema, ToolFailure};
    use crate::server::Dispatcher;
    use serde_json::{Map, Value, json};
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    /// Serve the math tools plus a `slow` tool on an ephemeral port.
    async fn spawn_provider() -> String {
        let tools = math_tools().unwrap();
        tools
            .register(
                ToolDescriptor::new("slow", "Sleeps before answering", InputSchema::object()),
                Arc::new(FnTool(|_arguments: Map<String, Value>| async {
                    tokio::time::sleep(Duration::from_millis(150)).await;
                    Ok::<_, ToolFailure>(json!("late"))
                })),
            )
            .unwrap();
        let dispatcher = Arc::new(Dispatcher::new("math", Arc::new(tools)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(TcpTransport::serve(listener, dispatcher));
        addr
    }

    fn remote(addr: &str, max_connections: usize) -> Arc<RemoteProvider> {
        Arc::new(RemoteProvider::connect(
            "math",
            addr,
            &PoolConfig {
                max_connections,
                acquire_timeout_ms: Some(1_000),
            },
        ))
    }

    #[tokio::test]
    async fn test_connection_demultiplexes_out_of_order_responses() {
        let addr = spawn_provider().await;
        let connection = Connection::open(&addr).await.unwrap();

        let slow = connection.call(Envelope::request(
            "c1",
            "tools/call",
            Some(json!({ "name": "slow" })),
        ));
        let fast = connection.call(Envelope::request(
            "c2",
            "tools/call",
            Some(json!({ "name": "add", "arguments": { "a": 2, "b": 3 } })),
        ));

        let (slow, fast) = tokio::join!(slow, fast);
        let (slow, fast) = (slow.unwrap(), fast.unwrap());
        assert_eq!(slow.id, "c1");
        assert_eq!(slow.result(), Some(&json!("late")));
        assert_eq!(fast.id, "c2");
        assert_eq!(fast.result(), Some(&json!(5)));
        assert_eq!(connection.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_bridge_over_tcp() {
        let addr = spawn_provider().await;
        let provider = remote(&addr, 2);
        let bridge = Bridge::builder().provider(provider.clone()).build().await.unwrap();

        let results = bridge
            .invoke_all(vec![
                ToolCall::new("add", args(json!({ "a": 15, "b": 25 }))),
                ToolCall::new("add", args(json!({ "a": 2, "b": 3 }))),
                ToolCall::new("divide", args(json!({ "a": 10, "b": 0 }))),
            ])
            .await;

        assert_eq!(results[0].as_ref().unwrap().result, json!(40));
        assert_eq!(results[1].as_ref().unwrap().result, json!(5));
        assert!(matches!(
            results[2],
            Err(BridgeError::Rpc { code: -32602, .. })
        ));

        assert!(provider.pool().idle_connections() <= 2);
        assert_eq!(provider.pool().active_connections(), 0);
    }

    #[tokio::test]
    async fn test_list_capabilities() {
        let addr = spawn_provider().await;
        let tools = remote(&addr, 1).list_capabilities().await.unwrap();

        let names: Vec<_> = tools.iter().map(|tool| tool.name.as_str()).collect();
        assert_eq!(names, vec!["add", "divide", "multiply", "slow", "subtract"]);
        assert!(tools[0].is_pure());
        assert!(!tools[3].is_pure());
    }

    #[tokio::test]
    async fn test_timeout_releases_connection_and_discards_late_response() {
        let addr = spawn_provider().await;
        let provider = remote(&addr, 1);
        let bridge = Bridge::builder()
            .provider(provider.clone())
            .timeout(Duration::from_millis(30))
            .build()
            .await
            .unwrap();

        let error = bridge
            .invoke(ToolCall::new("slow", Map::new()))
            .await
            .unwrap_err();
        assert!(matches!(error, BridgeError::Timeout(_)));
        assert_eq!(provider.pool().active_connections(), 0);

        // The late response lands on the reused connection and is dropped.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let sum = bridge
            .invoke(ToolCall::new("multiply", args(json!({ "a": 6, "b": 7 }))))
            .await
            .unwrap();
        assert_eq!(sum.result, json!(42));
        assert_eq!(provider.pool().idle_connections(), 1);
    }

    #[tokio::test]
    async fn test_misaddressed_remote_response_fails_fast() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut lines = BufReader::new(read_half).lines();
            while let Some(line) = lines.next_line().await.unwrap() {
                let request: Envelope = serde_json::from_str(&line).unwrap();
                let mut response = Envelope::success(&request, json!(0));
                response.id = "wrong".to_string();
                let text = encode(&response).unwrap();
                write_half.write_all(text.as_bytes()).await.unwrap();
                write_half.write_all(b"\n").await.unwrap();
            }
        });

        let provider = remote(&addr, 1);
        let bridge = Bridge::builder()
            .provider(provider)
            .timeout(Duration::from_secs(5))
            .build()
            .await
            .unwrap();

        let started = std::time::Instant::now();
        let error = bridge
            .invoke(ToolCall::new("add", args(json!({ "a": 1, "b": 2 }))))
            .await
            .unwrap_err();
        assert!(matches!(error, BridgeError::Protocol(_)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = remote(&addr, 1)
            .handle_request(Envelope::request("x", "ping", None))
            .await;
        assert!(matches!(result, Err(ProviderError::Pool(PoolError::Connect(_)))));
    }
}
