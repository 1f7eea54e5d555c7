//! Configuration management.
//!
//! A single [`Config`] with one section per component, populated from
//! defaults and then from `MCP_*` environment variables (a `.env` file is
//! honored).

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider identification and the tool sets it serves.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Caller-side bridge settings.
    pub bridge: BridgeConfig,

    /// Connection pool settings for out-of-process providers.
    pub pool: PoolConfig,

    /// Result cache settings.
    pub cache: CacheConfig,
}

/// Provider identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name reported by `initialize`.
    pub name: String,

    /// The version reported by `initialize`.
    pub version: String,

    /// Built-in tool sets to register (`math`, `search`).
    pub tool_sets: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Per-call deadline in milliseconds. `None` waits indefinitely.
    pub call_timeout_ms: Option<u64>,

    /// Correlation id namespace. A random one is generated when unset.
    pub instance_id: Option<String>,

    /// Entries kept in the execution log.
    pub log_capacity: usize,
}

/// Connection pool configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: usize,

    /// How long `acquire` waits in milliseconds. `None` waits indefinitely.
    pub acquire_timeout_ms: Option<u64>,
}

/// Result cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Maximum number of cached results.
    pub capacity: u64,
}

impl BridgeConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "math".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tool_sets: vec!["math".to_string(), "search".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: Some(30_000),
            instance_id: None,
            log_capacity: 1024,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 4,
            acquire_timeout_ms: Some(5_000),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 10_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            transport: TransportConfig::default(),
            bridge: BridgeConfig::default(),
            pool: PoolConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Variables are prefixed with `MCP_`, for example `MCP_SERVER_NAME` or
    /// `MCP_CALL_TIMEOUT_MS`. A timeout of `0` disables the deadline.
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(sets) = std::env::var("MCP_TOOL_SETS") {
            config.server.tool_sets = sets
                .split(',')
                .map(|set| set.trim().to_lowercase())
                .filter(|set| !set.is_empty())
                .collect();
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_env();

        if let Some(timeout) = env_parse::<u64>("MCP_CALL_TIMEOUT_MS") {
            config.bridge.call_timeout_ms = (timeout > 0).then_some(timeout);
        }

        if let Ok(instance) = std::env::var("MCP_BRIDGE_INSTANCE") {
            config.bridge.instance_id = Some(instance);
        }

        if let Some(capacity) = env_parse("MCP_EXECUTION_LOG_CAPACITY") {
            config.bridge.log_capacity = capacity;
        }

        if let Some(max) = env_parse("MCP_POOL_MAX_CONNECTIONS") {
            config.pool.max_connections = max;
        }

        if let Some(timeout) = env_parse::<u64>("MCP_POOL_ACQUIRE_TIMEOUT_MS") {
            config.pool.acquire_timeout_ms = (timeout > 0).then_some(timeout);
        }

        if let Some(enabled) = env_flag("MCP_CACHE_ENABLED") {
            config.cache.enabled = enabled;
        }

        if let Some(capacity) = env_parse("MCP_CACHE_CAPACITY") {
            config.cache.capacity = capacity;
        }

        config
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}: cannot parse {:?}", key, raw);
            None
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!("Ignoring {}: expected a boolean, got {:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: &[&str] = &[
        "MCP_SERVER_NAME",
        "MCP_TOOL_SETS",
        "MCP_CALL_TIMEOUT_MS",
        "MCP_BRIDGE_INSTANCE",
        "MCP_POOL_MAX_CONNECTIONS",
        "MCP_POOL_ACQUIRE_TIMEOUT_MS",
        "MCP_CACHE_ENABLED",
        "MCP_CACHE_CAPACITY",
    ];

    fn clear_env() {
        for key in KEYS {
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.tool_sets, vec!["math", "search"]);
        assert_eq!(config.bridge.call_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.pool.max_connections, 4);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_sections_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("MCP_SERVER_NAME", "calculator");
            std::env::set_var("MCP_TOOL_SETS", "Math, ");
            std::env::set_var("MCP_CALL_TIMEOUT_MS", "250");
            std::env::set_var("MCP_BRIDGE_INSTANCE", "agent-7");
            std::env::set_var("MCP_POOL_MAX_CONNECTIONS", "16");
            std::env::set_var("MCP_CACHE_ENABLED", "yes");
            std::env::set_var("MCP_CACHE_CAPACITY", "64");
        }

        let config = Config::from_env();
        assert_eq!(config.server.name, "calculator");
        assert_eq!(config.server.tool_sets, vec!["math"]);
        assert_eq!(config.bridge.call_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.bridge.instance_id.as_deref(), Some("agent-7"));
        assert_eq!(config.pool.max_connections, 16);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.capacity, 64);

        clear_env();
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("MCP_CALL_TIMEOUT_MS", "0");
            std::env::set_var("MCP_POOL_ACQUIRE_TIMEOUT_MS", "0");
        }

        let config = Config::from_env();
        assert_eq!(config.bridge.call_timeout(), None);
        assert_eq!(config.pool.acquire_timeout(), None);

        clear_env();
    }

    #[test]
    fn test_unparseable_values_keep_defaults() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("MCP_POOL_MAX_CONNECTIONS", "many");
            std::env::set_var("MCP_CACHE_ENABLED", "perhaps");
        }

        let config = Config::from_env();
        assert_eq!(config.pool.max_connections, 4);
        assert!(!config.cache.enabled);

        clear_env();
    }
}
