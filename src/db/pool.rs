//! Connection pool management.
//!
//! The driver (sqlx) owns sockets, handshakes and connection reuse. This module layers the
//! admission policy on top of it: a FIFO-fair permit per live connection, a bounded wait queue,
//! fail-fast when waiting is disabled, and an optional bound on the wait itself.
//!
//! Acquisition returns a [`PooledConnection`] guard. Dropping the guard hands the connection
//! back to the driver and frees its permit, so every exit path of an operation (success, error,
//! panic, cancelled future) releases exactly once.

use crate::config::PoolOptions;
use crate::error::{DbError, DbResult};
use serde_json::Value as JsonValue;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

pub const NO_CONNECTIONS_AVAILABLE: &str = "No connections available.";
pub const QUEUE_LIMIT_REACHED: &str = "Queue limit reached.";

/// A live database session borrowed from the driver.
pub trait SqlSession: Send {
    /// Execute one raw statement and return its result as JSON.
    ///
    /// Row-returning statements yield an array of `{column: value}` objects; other statements
    /// yield a summary object.
    fn run(&mut self, sql: &str) -> impl Future<Output = DbResult<JsonValue>> + Send;
}

/// The seam to the database driver.
pub trait ConnectionSource: Send + Sync + 'static {
    type Connection: SqlSession;

    /// Produce a live connection, reusing an idle one or opening a new one.
    fn checkout(&self) -> impl Future<Output = DbResult<Self::Connection>> + Send;

    /// Close every connection held by the driver.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Bounded connection pool with a configurable wait policy.
pub struct ConnectionPool<S: ConnectionSource> {
    source: S,
    permits: Arc<Semaphore>,
    waiting: AtomicUsize,
    options: PoolOptions,
}

impl<S: ConnectionSource> std::fmt::Debug for ConnectionPool<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("available", &self.available())
            .field("waiting", &self.waiting())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S: ConnectionSource> ConnectionPool<S> {
    /// Create a pool over `source`. `options` should already be validated.
    pub fn new(source: S, options: PoolOptions) -> Self {
        let limit = options.connection_limit.max(1) as usize;
        info!(
            connection_limit = limit,
            queue_limit = options.queue_limit,
            wait_for_connections = options.wait_for_connections,
            "Connection pool created"
        );
        Self {
            source,
            permits: Arc::new(Semaphore::new(limit)),
            waiting: AtomicUsize::new(0),
            options,
        }
    }

    /// Borrow a connection.
    ///
    /// Suspends while the pool is saturated and waiting is enabled. Waiters are served in
    /// arrival order.
    pub async fn acquire(&self) -> DbResult<PooledConnection<S::Connection>> {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(tokio::sync::TryAcquireError::Closed) => return Err(pool_closed()),
            Err(tokio::sync::TryAcquireError::NoPermits) => self.wait_for_permit().await?,
        };

        // The permit is dropped (and the slot freed) if the driver fails to connect
        let connection = self.source.checkout().await?;
        Ok(PooledConnection { connection, permit })
    }

    async fn wait_for_permit(&self) -> DbResult<OwnedSemaphorePermit> {
        if !self.options.wait_for_connections {
            debug!("Pool saturated and waiting disabled");
            return Err(DbError::pool_exhausted(NO_CONNECTIONS_AVAILABLE));
        }

        let _slot = self.enter_queue()?;
        debug!(waiting = self.waiting(), "Pool saturated, waiting for a connection");

        let acquire = Arc::clone(&self.permits).acquire_owned();
        let permit = match self.options.acquire_timeout {
            Some(limit) => match tokio::time::timeout(limit, acquire).await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(
                        timeout_secs = limit.as_secs(),
                        "Timed out waiting for a free connection"
                    );
                    return Err(DbError::timeout("connection acquire", limit.as_secs()));
                }
            },
            None => acquire.await,
        };
        permit.map_err(|_| pool_closed())
    }

    /// Reserve a place in the wait queue, honouring the queue limit.
    fn enter_queue(&self) -> DbResult<QueueSlot<'_>> {
        let limit = self.options.queue_limit;
        self.waiting
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (limit == 0 || current < limit).then_some(current + 1)
            })
            .map_err(|_| DbError::pool_exhausted(QUEUE_LIMIT_REACHED))?;
        Ok(QueueSlot {
            waiting: &self.waiting,
        })
    }

    /// Number of connections that can be handed out without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Number of callers currently waiting for a connection.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Stop handing out connections and close the driver pool.
    pub async fn close(&self) {
        self.permits.close();
        self.source.close().await;
        info!("Connection pool closed");
    }
}

fn pool_closed() -> DbError {
    DbError::connection("Connection pool is closed", "Restart the server")
}

/// A caller's place in the wait queue; leaving (by any path) frees it.
struct QueueSlot<'a> {
    waiting: &'a AtomicUsize,
}

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.waiting.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A borrowed connection. Dropping it returns the connection to the pool.
pub struct PooledConnection<C> {
    // Field order matters: the connection goes back to the driver before the permit is freed.
    connection: C,
    permit: OwnedSemaphorePermit,
}

impl<C> std::fmt::Debug for PooledConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("permits", &self.permit.num_permits())
            .finish_non_exhaustive()
    }
}

impl<C> Deref for PooledConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.connection
    }
}

impl<C> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.connection
    }
}
