//! Connections to a single Quill server.

mod server;
mod tcp;

pub use server::{ServerDescription, ServerVersion};
pub use tcp::{ConnectionId, TcpConnection};

use std::net::SocketAddr;

use async_trait::async_trait;
use quill_core::{Document, Namespace, RequestMessage, ResponseBuffers, Result};

/// Durability guarantee requested from a legacy write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteConcern {
    /// Fire-and-forget: the server does not confirm the write.
    Unacknowledged,
    /// The server confirms durability before the call returns.
    Acknowledged,
}

/// Outcome of a legacy write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteResult {
    acknowledged: bool,
    count: i64,
    response: Option<Document>,
}

impl WriteResult {
    /// A result for an unacknowledged write; nothing is known about it.
    pub fn unacknowledged() -> Self {
        Self {
            acknowledged: false,
            count: 0,
            response: None,
        }
    }

    /// A result built from the server's acknowledgment document.
    pub fn acknowledged(response: Document) -> Self {
        let count = response
            .get("n")
            .and_then(|v| v.as_f64())
            .map(|n| n as i64)
            .unwrap_or(0);
        Self {
            acknowledged: true,
            count,
            response: Some(response),
        }
    }

    /// True if the server confirmed the write.
    pub fn was_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// Number of documents the write touched, when acknowledged.
    pub fn count(&self) -> i64 {
        self.count
    }

    /// The raw acknowledgment document, when acknowledged.
    pub fn response(&self) -> Option<&Document> {
        self.response.as_ref()
    }

    /// Returns the acknowledgment document if it reports a write error.
    ///
    /// The whole server document is surfaced verbatim so that legacy-path
    /// failures converge to the same error shape as command failures.
    pub fn error_document(&self) -> Option<&Document> {
        let response = self.response.as_ref()?;
        match response.get("err") {
            Some(value) if !value.is_null() => Some(response),
            _ => None,
        }
    }
}

/// One established channel to one server.
///
/// Object-safe so bindings can hand out boxed handles and tests can
/// substitute doubles. The handle owns no document-level semantics; it moves
/// already-encoded messages and hands back raw reply buffers.
#[async_trait]
pub trait Connection: Send {
    /// The negotiated capability snapshot of the server behind this channel.
    fn description(&self) -> &ServerDescription;

    /// The remote server address.
    fn address(&self) -> SocketAddr;

    /// Sends one request and receives its reply as a single exchange.
    ///
    /// No pipelining happens within one exchange; the message is consumed.
    async fn send_and_receive(&mut self, message: RequestMessage) -> Result<ResponseBuffers>;

    /// Legacy write path: inserts documents into `namespace`.
    ///
    /// With [`WriteConcern::Acknowledged`] the returned result carries the
    /// server's acknowledgment document.
    async fn insert(
        &mut self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: WriteConcern,
        documents: Vec<Document>,
    ) -> Result<WriteResult>;

    /// Closes the channel.
    async fn close(&mut self) -> Result<()>;
}
