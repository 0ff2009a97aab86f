//! Async Rust client for the Quill document database.
//!
//! This crate is the operation-execution layer of the client: it turns a
//! logical request into a wire exchange with a server and classifies the raw
//! reply into a typed result or a typed failure. It is built on
//! [Tokio](https://tokio.rs/) and exposes every operation as an `async fn`,
//! with a continuation form for callers that register a callback instead of
//! awaiting.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use quill_client::{Client, ClientConfig, Find};
//! use quill_core::{Document, Namespace};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .address("127.0.0.1:27017".parse()?)
//!         .build()?;
//!     let client = Client::new(config);
//!
//!     let namespace = Namespace::new("app", "orders")?;
//!     let find = Find::new().filter(Document::new().with("status", "A"));
//!     let result = client.find_documents(namespace, find).await?;
//!     println!("matched {} documents", result.documents().len());
//!
//!     client.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Protocol paths
//!
//! Administrative operations are capability-gated: against servers at or
//! above version 2.6 they run through the unified command protocol, against
//! older servers through the legacy write protocol. Both paths produce the
//! same results and converge failures into the same error shape.

#![warn(missing_docs)]

pub mod binding;
pub mod client;
pub mod config;
pub mod connection;
pub mod credential;
pub mod operations;
pub mod pool;
pub mod runtime;

pub use binding::{Binding, PooledConnection, ReadPreference, SelectionCriteria};
pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use connection::{
    Connection, ServerDescription, ServerVersion, TcpConnection, WriteConcern, WriteResult,
};
pub use credential::Credential;
pub use operations::{
    protocol_path, CreateUserOperation, Find, ProtocolPath, QueryOperation, QueryResult,
    ReadOperation, WriteOperation,
};
pub use pool::ConnectionPool;
pub use runtime::{Runtime, TokioRuntime};

pub use quill_core::{Document, Namespace, QuillError, Result, Value};
