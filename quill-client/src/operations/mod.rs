//! Operation executors.
//!
//! An operation turns a logical request into a wire exchange over a
//! connection acquired from a [`Binding`], and classifies the reply into a
//! typed result or a typed failure. Two operation families share the same
//! acquisition/release skeleton: command-style operations produce no payload
//! on success, query-style operations produce a typed document sequence.
//!
//! Every operation comes in an awaitable form and a continuation form
//! (`execute_async`); for a single operation instance, exactly one terminal
//! outcome is ever delivered.

mod create_user;
mod helpers;
mod query;

pub use create_user::CreateUserOperation;
pub use helpers::{protocol_path, ProtocolPath};
pub use query::{Find, QueryOperation, QueryResult};

use async_trait::async_trait;
use quill_core::Result;

use crate::binding::Binding;

/// A write-style operation that reports only success or failure.
#[async_trait]
pub trait WriteOperation: Send + Sync {
    /// Executes the operation over a connection acquired from the binding.
    async fn execute(&self, binding: &dyn Binding) -> Result<()>;
}

/// A read-style operation producing a typed output.
#[async_trait]
pub trait ReadOperation: Send + Sync {
    /// The value produced on success.
    type Output;

    /// Executes the operation over a connection acquired from the binding.
    async fn execute(&self, binding: &dyn Binding) -> Result<Self::Output>;
}
