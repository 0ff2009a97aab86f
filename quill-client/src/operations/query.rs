//! Query-style operation returning a typed document sequence.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use quill_core::protocol::constants::QUERY_FLAG_SECONDARY_OK;
use quill_core::{Decoder, Document, Encoder, Namespace, QuillError, RequestMessage, Result};

use super::ReadOperation;
use crate::binding::{Binding, ReadPreference, SelectionCriteria};
use crate::connection::Connection;
use crate::runtime::Runtime;

/// A query specification: filter, projection, paging, and read routing.
#[derive(Debug, Clone, Default)]
pub struct Find {
    filter: Document,
    projection: Option<Document>,
    skip: i32,
    limit: i32,
    read_preference: ReadPreference,
}

impl Find {
    /// Creates an empty query matching everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter document.
    pub fn filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the projection document.
    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Sets how many matching documents to skip.
    pub fn skip(mut self, skip: i32) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the read routing preference.
    pub fn read_preference(mut self, read_preference: ReadPreference) -> Self {
        self.read_preference = read_preference;
        self
    }

    /// Returns the read routing preference.
    pub fn preference(&self) -> ReadPreference {
        self.read_preference
    }
}

/// The typed outcome of a query: decoded documents plus cursor state and the
/// answering server's address.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    documents: Vec<T>,
    cursor_id: i64,
    starting_from: i32,
    address: SocketAddr,
}

impl<T> QueryResult<T> {
    /// Borrows the decoded documents.
    pub fn documents(&self) -> &[T] {
        &self.documents
    }

    /// Consumes the result, yielding the decoded documents.
    pub fn into_documents(self) -> Vec<T> {
        self.documents
    }

    /// The cursor the server left open, or 0 when exhausted.
    pub fn cursor_id(&self) -> i64 {
        self.cursor_id
    }

    /// Position of this batch's first document within the cursor.
    pub fn starting_from(&self) -> i32 {
        self.starting_from
    }

    /// The server that answered.
    pub fn address(&self) -> SocketAddr {
        self.address
    }
}

/// Executes a query and decodes the reply body as a sequence of `T`.
///
/// The filter is encoded through the pluggable query encoder; results decode
/// through the caller-supplied decoder. Failure detection never invokes the
/// typed decoder: a failed reply's single error document is read with the
/// fixed generic codec instead.
pub struct QueryOperation<T> {
    namespace: Namespace,
    find: Find,
    query_encoder: Arc<dyn Encoder<Document>>,
    result_decoder: Arc<dyn Decoder<T>>,
}

impl<T> Clone for QueryOperation<T> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            find: self.find.clone(),
            query_encoder: Arc::clone(&self.query_encoder),
            result_decoder: Arc::clone(&self.result_decoder),
        }
    }
}

impl<T> QueryOperation<T> {
    /// Constructs the operation.
    pub fn new(
        namespace: Namespace,
        find: Find,
        query_encoder: Arc<dyn Encoder<Document>>,
        result_decoder: Arc<dyn Decoder<T>>,
    ) -> Self {
        Self {
            namespace,
            find,
            query_encoder,
            result_decoder,
        }
    }

    /// Executes the query on a connection acquired through the binding using
    /// the query's read preference. The connection is released exactly once
    /// after the exchange, on every path.
    pub async fn execute(&self, binding: &dyn Binding) -> Result<QueryResult<T>> {
        let mut connection = binding
            .acquire(SelectionCriteria::ReadPreference(self.find.preference()))
            .await?;
        self.execute_on(connection.connection_mut()).await
    }

    /// Executes the query on a caller-supplied connection; its lifetime
    /// remains the caller's responsibility.
    pub async fn execute_on(&self, connection: &mut dyn Connection) -> Result<QueryResult<T>> {
        let flags = if self.find.preference().permits_secondary() {
            QUERY_FLAG_SECONDARY_OK
        } else {
            0
        };
        let message = RequestMessage::query(
            &self.namespace.full_name(),
            flags,
            self.find.skip,
            self.find.limit,
            &self.find.filter,
            self.find.projection.as_ref(),
            self.query_encoder.as_ref(),
        )?;
        let request_id = message.request_id();
        let address = connection.address();

        let mut buffers = connection.send_and_receive(message).await?;
        buffers.correlate(request_id)?;
        if buffers.header().is_query_failure() {
            let error = buffers.error_document()?;
            return Err(QuillError::Protocol { address, error });
        }

        let documents = buffers.documents(self.result_decoder.as_ref())?;
        Ok(QueryResult {
            documents,
            cursor_id: buffers.header().cursor_id(),
            starting_from: buffers.header().starting_from(),
            address,
        })
        // buffers drop here on every branch, releasing the reply storage
    }

    /// Continuation form: spawns the exchange and invokes `callback` exactly
    /// once with the terminal outcome.
    pub fn execute_async<R, C>(&self, binding: Arc<dyn Binding>, runtime: &R, callback: C)
    where
        T: Send + 'static,
        R: Runtime,
        C: FnOnce(Result<QueryResult<T>>) + Send + 'static,
    {
        let operation = self.clone();
        runtime.spawn(async move {
            let result = operation.execute(binding.as_ref()).await;
            callback(result);
        });
    }
}

impl<T> std::fmt::Debug for QueryOperation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOperation")
            .field("namespace", &self.namespace)
            .field("find", &self.find)
            .finish()
    }
}

#[async_trait]
impl<T: Send + 'static> ReadOperation for QueryOperation<T> {
    type Output = QueryResult<T>;

    async fn execute(&self, binding: &dyn Binding) -> Result<QueryResult<T>> {
        QueryOperation::execute(self, binding).await
    }
}
