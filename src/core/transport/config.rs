//! Transport configuration types.

use serde::{Deserialize, Serialize};
#[cfg(any(feature = "tcp", feature = "http"))]
use tracing::warn;

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Line-delimited envelopes over stdin/stdout.
    #[cfg(feature = "stdio")]
    Stdio,

    /// Line-delimited envelopes over a TCP socket.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),

    /// One envelope per HTTP POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// TCP transport configuration.
#[cfg(feature = "tcp")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path of the RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
        {
            return Self::Tcp(TcpConfig::default());
        }

        #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "tcp", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio, tcp, or http");
        }
    }
}

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Load transport config from environment variables.
    ///
    /// `MCP_TRANSPORT` selects the transport; unknown or missing values fall
    /// back to the first enabled transport. Unparseable ports keep their
    /// defaults.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "tcp")]
            "tcp" => {
                let mut tcp = TcpConfig::default();
                if let Some(port) = env_port("MCP_TCP_PORT") {
                    tcp.port = port;
                }
                if let Ok(host) = std::env::var("MCP_TCP_HOST") {
                    tcp.host = host;
                }
                Self::Tcp(tcp)
            }
            #[cfg(feature = "http")]
            "http" => {
                let mut http = HttpConfig::default();
                if let Some(port) = env_port("MCP_HTTP_PORT") {
                    http.port = port;
                }
                if let Ok(host) = std::env::var("MCP_HTTP_HOST") {
                    http.host = host;
                }
                if let Ok(path) = std::env::var("MCP_HTTP_PATH") {
                    http.rpc_path = path;
                }
                if let Ok(cors) = std::env::var("MCP_HTTP_CORS") {
                    http.enable_cors = !matches!(cors.trim().to_lowercase().as_str(), "false" | "0");
                }
                Self::Http(http)
            }
            #[cfg(feature = "stdio")]
            _ => Self::Stdio,
            #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
            _ => Self::Tcp(TcpConfig::default()),
            #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
            _ => Self::Http(HttpConfig::default()),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (line-delimited JSON)".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}:{} (line-delimited JSON)", cfg.host, cfg.port),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn env_port(key: &str) -> Option<u16> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(port) => Some(port),
        Err(_) => {
            warn!("Ignoring {}: {:?} is not a port number", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[cfg(feature = "tcp")]
    #[test]
    fn test_tcp_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_TRANSPORT", "TCP");
            std::env::set_var("MCP_TCP_PORT", "4100");
            std::env::remove_var("MCP_TCP_HOST");
        }

        let config = TransportConfig::from_env();
        match &config {
            TransportConfig::Tcp(tcp) => {
                assert_eq!(tcp.port, 4100);
                assert_eq!(tcp.host, "127.0.0.1");
            }
            other => panic!("unexpected transport: {:?}", other),
        }
        assert!(config.description().contains("127.0.0.1:4100"));

        unsafe {
            std::env::set_var("MCP_TCP_PORT", "not-a-port");
        }
        assert!(matches!(TransportConfig::from_env(), TransportConfig::Tcp(ref tcp) if tcp.port == 3000));

        unsafe {
            std::env::remove_var("MCP_TRANSPORT");
            std::env::remove_var("MCP_TCP_PORT");
        }
    }

    #[cfg(feature = "stdio")]
    #[test]
    fn test_unknown_transport_falls_back() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_TRANSPORT", "carrier-pigeon");
        }
        assert!(matches!(TransportConfig::from_env(), TransportConfig::Stdio));
        unsafe {
            std::env::remove_var("MCP_TRANSPORT");
        }
    }

    #[test]
    fn test_serde_tagging() {
        let value = serde_json::to_value(TransportConfig::default()).unwrap();
        assert!(value["type"].is_string());
    }
}
