//! High-level client facade.

use std::sync::Arc;

use quill_core::{Decoder, Document, DocumentCodec, Namespace, Result};

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::operations::{CreateUserOperation, Find, QueryOperation, QueryResult};
use crate::pool::ConnectionPool;

/// A client for one Quill server.
///
/// Holds the connection pool and wires configured defaults into the
/// operation executors. Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    pool: ConnectionPool,
}

impl Client {
    /// Creates a client. No connection is opened until the first operation.
    pub fn new(config: ClientConfig) -> Self {
        let pool = ConnectionPool::new(config.clone());
        Self { config, pool }
    }

    /// Returns the client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Creates a user in the credential's source database.
    pub async fn create_user(&self, credential: Credential, read_only: bool) -> Result<()> {
        CreateUserOperation::new(credential, read_only)
            .execute(&self.pool)
            .await
    }

    /// Runs a query, decoding results with the supplied decoder.
    pub async fn find<T: Send + 'static>(
        &self,
        namespace: Namespace,
        find: Find,
        decoder: Arc<dyn Decoder<T>>,
    ) -> Result<QueryResult<T>> {
        QueryOperation::new(namespace, find, Arc::new(DocumentCodec), decoder)
            .execute(&self.pool)
            .await
    }

    /// Runs a query, decoding results as generic documents.
    pub async fn find_documents(
        &self,
        namespace: Namespace,
        find: Find,
    ) -> Result<QueryResult<Document>> {
        self.find(namespace, find, Arc::new(DocumentCodec)).await
    }

    /// Closes idle pooled connections.
    pub async fn shutdown(&self) -> Result<()> {
        self.pool.close().await
    }
}
