//! Connection acquisition seam between executors and the pool.

use std::net::SocketAddr;

use async_trait::async_trait;
use quill_core::Result;

use crate::connection::{Connection, ServerDescription};

/// How a server should be selected for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionCriteria {
    /// Any server that accepts writes.
    Writable,
    /// A server satisfying the given read preference.
    ReadPreference(ReadPreference),
}

/// Read routing preference for query-style operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPreference {
    /// Only the primary.
    #[default]
    Primary,
    /// The primary when available, otherwise a secondary.
    PrimaryPreferred,
    /// Only a secondary.
    Secondary,
    /// A secondary when available, otherwise the primary.
    SecondaryPreferred,
    /// The lowest-latency eligible server.
    Nearest,
}

impl ReadPreference {
    /// True if the preference allows execution on a non-primary server.
    pub fn permits_secondary(&self) -> bool {
        !matches!(self, ReadPreference::Primary)
    }
}

/// Supplies connections to operation executors.
///
/// A binding encapsulates the pool and the selection policy; executors only
/// name the criteria. An acquisition failure holds no partial resources.
#[async_trait]
pub trait Binding: Send + Sync {
    /// Acquires a connection matching the criteria.
    async fn acquire(&self, criteria: SelectionCriteria) -> Result<PooledConnection>;
}

type ReleaseFn = Box<dyn FnOnce(Box<dyn Connection>) + Send>;

/// An owning guard over an acquired connection.
///
/// Dropping the guard releases the connection exactly once, on every exit
/// path: success, decode failure, transport failure, and task cancellation
/// alike. In the continuation execution form the guard is dropped inside the
/// completing task, so release happens before the caller's callback runs.
pub struct PooledConnection {
    connection: Option<Box<dyn Connection>>,
    release: Option<ReleaseFn>,
}

impl PooledConnection {
    /// Wraps a connection with a release hook invoked on drop.
    pub fn new(
        connection: Box<dyn Connection>,
        release: impl FnOnce(Box<dyn Connection>) + Send + 'static,
    ) -> Self {
        Self {
            connection: Some(connection),
            release: Some(Box::new(release)),
        }
    }

    /// Wraps a connection with no release hook; dropping simply drops it.
    pub fn detached(connection: Box<dyn Connection>) -> Self {
        Self {
            connection: Some(connection),
            release: None,
        }
    }

    /// Borrows the underlying connection.
    pub fn connection_mut(&mut self) -> &mut dyn Connection {
        self.connection
            .as_deref_mut()
            .expect("connection present until drop")
    }

    /// The server description of the held connection.
    pub fn description(&self) -> &ServerDescription {
        self.connection
            .as_deref()
            .expect("connection present until drop")
            .description()
    }

    /// The address of the held connection.
    pub fn address(&self) -> SocketAddr {
        self.connection
            .as_deref()
            .expect("connection present until drop")
            .address()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Some(release) = self.release.take() {
                release(connection);
            }
        }
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("held", &self.connection.is_some())
            .field("has_release", &self.release.is_some())
            .finish()
    }
}
