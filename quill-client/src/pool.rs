//! Checkout/checkin connection pool over a single server address.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quill_core::{QuillError, Result};

use crate::binding::{Binding, PooledConnection, SelectionCriteria};
use crate::config::ClientConfig;
use crate::connection::{Connection, TcpConnection};

/// A pool of connections to one server, implementing [`Binding`].
///
/// Topology-aware server selection is the binding seam's concern; this pool
/// resolves every criteria to its single configured address.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    config: ClientConfig,
    idle: Mutex<Vec<Box<dyn Connection>>>,
    checked_out: AtomicUsize,
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("address", &self.inner.config.address())
            .field("idle", &self.idle_count())
            .field("checked_out", &self.checked_out_count())
            .finish()
    }
}

impl ConnectionPool {
    /// Creates an empty pool for the configured address. No connections are
    /// opened until the first checkout.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                config,
                idle: Mutex::new(Vec::new()),
                checked_out: AtomicUsize::new(0),
            }),
        }
    }

    /// Checks a connection out of the pool, opening a new one if no idle
    /// connection is available and the pool is under its size limit.
    pub async fn checkout(&self) -> Result<PooledConnection> {
        // The slot is reserved before any suspension point so concurrent
        // checkouts racing past an in-flight connect cannot exceed the limit.
        let previous = self.inner.checked_out.fetch_add(1, Ordering::SeqCst);
        if previous >= self.inner.config.max_pool_size() {
            self.inner.checked_out.fetch_sub(1, Ordering::SeqCst);
            return Err(QuillError::Acquisition(format!(
                "pool for {} is exhausted ({} connections checked out)",
                self.inner.config.address(),
                self.inner.config.max_pool_size()
            )));
        }

        let connection = match self.connection_for_slot().await {
            Ok(connection) => connection,
            Err(e) => {
                self.inner.checked_out.fetch_sub(1, Ordering::SeqCst);
                return Err(e);
            }
        };
        tracing::trace!(address = %connection.address(), "checked out connection");

        let inner = Arc::clone(&self.inner);
        Ok(PooledConnection::new(connection, move |connection| {
            inner.checkin(connection);
        }))
    }

    async fn connection_for_slot(&self) -> Result<Box<dyn Connection>> {
        if let Some(connection) = self.inner.idle.lock().map_or(None, |mut idle| idle.pop()) {
            return Ok(connection);
        }

        let address = self.inner.config.address();
        let connection = tokio::time::timeout(
            self.inner.config.connect_timeout(),
            TcpConnection::connect(address),
        )
        .await
        .map_err(|_| {
            QuillError::Acquisition(format!(
                "timed out connecting to {} after {:?}",
                address,
                self.inner.config.connect_timeout()
            ))
        })?
        .map_err(|e| QuillError::Acquisition(e.to_string()))?;
        Ok(Box::new(connection))
    }

    /// Number of idle connections currently held.
    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().map_or(0, |idle| idle.len())
    }

    /// Number of connections currently checked out.
    pub fn checked_out_count(&self) -> usize {
        self.inner.checked_out.load(Ordering::SeqCst)
    }

    /// Closes every idle connection. Checked-out connections close when they
    /// are dropped after checkin.
    pub async fn close(&self) -> Result<()> {
        let drained = match self.inner.idle.lock() {
            Ok(mut idle) => std::mem::take(&mut *idle),
            Err(_) => Vec::new(),
        };
        for mut connection in drained {
            if let Err(e) = connection.close().await {
                tracing::debug!(error = %e, "error closing pooled connection");
            }
        }
        Ok(())
    }
}

impl PoolInner {
    fn checkin(&self, connection: Box<dyn Connection>) {
        self.checked_out.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(address = %connection.address(), "checked in connection");
        if let Ok(mut idle) = self.idle.lock() {
            idle.push(connection);
        }
    }
}

#[async_trait]
impl Binding for ConnectionPool {
    async fn acquire(&self, criteria: SelectionCriteria) -> Result<PooledConnection> {
        if let SelectionCriteria::ReadPreference(preference) = criteria {
            tracing::trace!(preference = ?preference, "selecting connection by read preference");
        }
        self.checkout().await
    }
}
