//! Caller side of the dispatch core.
//!
//! - `bridge.rs` - turns structured tool calls into request envelopes and back
//! - `correlation.rs` - in-flight request id to response slot mapping
//! - `pool.rs` - bounded connection pool for out-of-process providers
//! - `remote.rs` - TCP provider client built on the pool (feature `tcp`)
//! - `cache.rs` - bounded memoization of pure tool results
//! - `execution_log.rs` - execution log for observability
//! - `error.rs` - caller-facing errors

mod bridge;
mod cache;
mod correlation;
mod error;
mod execution_log;
mod pool;

#[cfg(feature = "tcp")]
mod remote;

pub use bridge::{Bridge, BridgeBuilder, CacheSettings, ToolCall, ToolInvocation};
pub use cache::{CacheStats, ResultCache};
pub use correlation::{PendingRequests, PendingResponse};
pub use error::{BridgeError, PoolError};
pub use execution_log::{ExecutionLog, ExecutionLogEntry, ExecutionOutcome};
pub use pool::{ConnectionPool, Connector, PooledConnection};

#[cfg(feature = "tcp")]
pub use remote::{Connection, RemoteProvider, TcpConnector};
