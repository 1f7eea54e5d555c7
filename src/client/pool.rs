//! Connection Pool - bounds outstanding connections to a provider.
//!
//! At most `max_connections` connections exist at any time. A caller holds a
//! semaphore permit for as long as it has a connection checked out, so a
//! connection is never handed to two callers at once. Returning a connection
//! pushes it onto the idle set before the permit is released, so the next
//! waiter reuses it instead of opening a new one.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use super::error::PoolError;

/// Opens connections for a pool.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: Send + 'static;

    /// Open a new connection.
    async fn connect(&self) -> Result<Self::Connection, PoolError>;

    /// Whether a returned connection may be reused.
    fn is_healthy(&self, _connection: &Self::Connection) -> bool {
        true
    }
}

struct PoolInner<C: Connector> {
    connector: C,
    idle: Mutex<Vec<C::Connection>>,
    permits: Arc<Semaphore>,
    active: AtomicUsize,
    max_connections: usize,
}

/// Bounded pool of connections.
pub struct ConnectionPool<C: Connector> {
    inner: Arc<PoolInner<C>>,
    acquire_timeout: Option<Duration>,
}

impl<C: Connector> Clone for ConnectionPool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            acquire_timeout: self.acquire_timeout,
        }
    }
}

impl<C: Connector> ConnectionPool<C> {
    /// Create a pool holding at most `max_connections` (minimum 1).
    pub fn new(connector: C, max_connections: usize) -> Self {
        let max_connections = max_connections.max(1);
        Self {
            inner: Arc::new(PoolInner {
                connector,
                idle: Mutex::new(Vec::new()),
                permits: Arc::new(Semaphore::new(max_connections)),
                active: AtomicUsize::new(0),
                max_connections,
            }),
            acquire_timeout: None,
        }
    }

    /// Bound how long [`acquire`](Self::acquire) waits.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Check out a connection, waiting while the pool is exhausted.
    ///
    /// Dropping the returned future cancels the wait without side effects.
    pub async fn acquire(&self) -> Result<PooledConnection<C>, PoolError> {
        match self.acquire_timeout {
            Some(limit) => tokio::time::timeout(limit, self.checkout())
                .await
                .map_err(|_| {
                    warn!("Gave up waiting for a connection after {:?}", limit);
                    PoolError::Timeout(limit)
                })?,
            None => self.checkout().await,
        }
    }

    async fn checkout(&self) -> Result<PooledConnection<C>, PoolError> {
        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        let idle = self.inner.idle.lock().pop();
        let connection = match idle {
            Some(connection) => connection,
            None => {
                debug!("Opening a new pooled connection");
                self.inner.connector.connect().await?
            }
        };

        self.inner.active.fetch_add(1, Ordering::AcqRel);
        Ok(PooledConnection {
            connection: Some(connection),
            pool: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    /// Connections currently checked out.
    pub fn active_connections(&self) -> usize {
        self.inner.active.load(Ordering::Acquire)
    }

    /// Connections waiting in the idle set.
    pub fn idle_connections(&self) -> usize {
        self.inner.idle.lock().len()
    }

    pub fn max_connections(&self) -> usize {
        self.inner.max_connections
    }

    /// Close the pool: pending and future acquires fail with
    /// [`PoolError::Closed`] and idle connections are dropped.
    pub fn close(&self) {
        self.inner.permits.close();
        self.inner.idle.lock().clear();
    }
}

/// A checked-out connection. Returned to the pool on [`release`](Self::release)
/// or drop.
pub struct PooledConnection<C: Connector> {
    connection: Option<C::Connection>,
    pool: Arc<PoolInner<C>>,
    _permit: OwnedSemaphorePermit,
}

impl<C: Connector> PooledConnection<C> {
    /// Return the connection to the idle set.
    pub fn release(self) {}

    /// Close the connection instead of returning it.
    pub fn discard(mut self) {
        self.connection.take();
    }
}

impl<C: Connector> fmt::Debug for PooledConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("open", &self.connection.is_some())
            .field("active", &self.pool.active.load(Ordering::Acquire))
            .field("max", &self.pool.max_connections)
            .finish()
    }
}

impl<C: Connector> Deref for PooledConnection<C> {
    type Target = C::Connection;

    fn deref(&self) -> &Self::Target {
        // Only `discard` and `drop` take the connection, and both consume `self`.
        self.connection.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<C: Connector> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<C: Connector> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            if self.pool.connector.is_healthy(&connection) && !self.pool.permits.is_closed() {
                self.pool.idle.lock().push(connection);
            } else {
                debug!("Dropping unhealthy pooled connection");
            }
        }
        self.pool.active.fetch_sub(1, Ordering::AcqRel);
        // `_permit` is released after this body runs.
    }
}
