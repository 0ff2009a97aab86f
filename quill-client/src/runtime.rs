//! Runtime abstraction for continuation-style execution.
//!
//! Operations expose an `execute_async` form that spawns the exchange and
//! delivers the outcome to a callback. The spawn goes through the [`Runtime`]
//! trait so downstream code and tests can substitute the completion context;
//! [`TokioRuntime`] is the default implementation.

use std::future::Future;

/// Abstraction over an async runtime's task spawner.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared
/// across tasks and stored in long-lived structures.
pub trait Runtime: Send + Sync + 'static {
    /// Spawns a future as a background task.
    ///
    /// The future runs to completion even if the caller never looks back.
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// The default [`Runtime`] implementation backed by Tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRuntime;

impl Runtime for TokioRuntime {
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(future);
    }
}
