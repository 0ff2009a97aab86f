//! TCP connection to a single Quill server.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::BytesMut;
use quill_core::protocol::MessageCodec;
use quill_core::{
    Document, DocumentCodec, Namespace, QuillError, RequestMessage, ResponseBuffers, Result,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder};

use super::{Connection, ServerDescription, ServerVersion, WriteConcern, WriteResult};

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A [`Connection`] over a plain TCP stream.
#[derive(Debug)]
pub struct TcpConnection {
    id: ConnectionId,
    address: SocketAddr,
    stream: TcpStream,
    codec: MessageCodec,
    read_buffer: BytesMut,
    description: ServerDescription,
}

impl TcpConnection {
    /// Establishes a connection to the given address and performs the
    /// handshake that populates the server description.
    pub async fn connect(address: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(address).await.map_err(|e| {
            QuillError::Transport(format!("failed to connect to {}: {}", address, e))
        })?;
        stream.set_nodelay(true).map_err(|e| {
            QuillError::Transport(format!("failed to set TCP_NODELAY: {}", e))
        })?;

        let mut connection = Self {
            id: ConnectionId::new(),
            address,
            stream,
            codec: MessageCodec::new(),
            read_buffer: BytesMut::with_capacity(8192),
            description: ServerDescription::new(address, ServerVersion::new(0, 0, 0)),
        };
        connection.handshake().await?;
        tracing::debug!(
            id = %connection.id,
            address = %address,
            version = %connection.description.version(),
            "established connection"
        );
        Ok(connection)
    }

    async fn handshake(&mut self) -> Result<()> {
        let reply = self
            .run_command("admin", &Document::new().with("buildinfo", 1))
            .await?;
        let version = reply.get_str("version").ok_or_else(|| {
            QuillError::Decode("handshake reply is missing the version field".to_string())
        })?;
        self.description = ServerDescription::new(self.address, ServerVersion::parse(version)?);
        Ok(())
    }

    async fn run_command(&mut self, database: &str, command: &Document) -> Result<Document> {
        let message = RequestMessage::command(database, command, &DocumentCodec)?;
        let request_id = message.request_id();
        let mut buffers = self.exchange(message).await?;
        buffers.correlate(request_id)?;
        if buffers.header().is_query_failure() {
            let error = buffers.error_document()?;
            return Err(QuillError::Protocol {
                address: self.address,
                error,
            });
        }
        buffers
            .documents(&DocumentCodec)?
            .into_iter()
            .next()
            .ok_or_else(|| QuillError::Decode("command reply carried no document".to_string()))
    }

    async fn write_message(&mut self, message: RequestMessage) -> Result<()> {
        let mut buf = BytesMut::new();
        self.codec.encode(message, &mut buf)?;
        self.stream.write_all(&buf).await.map_err(|e| {
            QuillError::Transport(format!("failed to write to {}: {}", self.address, e))
        })
    }

    async fn exchange(&mut self, message: RequestMessage) -> Result<ResponseBuffers> {
        self.write_message(message).await?;
        loop {
            if let Some(buffers) = self.codec.decode(&mut self.read_buffer)? {
                return Ok(buffers);
            }

            let bytes_read = self
                .stream
                .read_buf(&mut self.read_buffer)
                .await
                .map_err(|e| {
                    QuillError::Transport(format!("failed to read from {}: {}", self.address, e))
                })?;
            if bytes_read == 0 {
                return Err(QuillError::Transport(format!(
                    "connection to {} closed before a reply arrived",
                    self.address
                )));
            }
        }
    }
}

#[async_trait]
impl Connection for TcpConnection {
    fn description(&self) -> &ServerDescription {
        &self.description
    }

    fn address(&self) -> SocketAddr {
        self.address
    }

    async fn send_and_receive(&mut self, message: RequestMessage) -> Result<ResponseBuffers> {
        self.exchange(message).await
    }

    async fn insert(
        &mut self,
        namespace: &Namespace,
        ordered: bool,
        write_concern: WriteConcern,
        documents: Vec<Document>,
    ) -> Result<WriteResult> {
        let message =
            RequestMessage::insert(&namespace.full_name(), ordered, &documents, &DocumentCodec)?;
        self.write_message(message).await?;

        match write_concern {
            WriteConcern::Unacknowledged => Ok(WriteResult::unacknowledged()),
            WriteConcern::Acknowledged => {
                // The insert opcode carries no reply; durability confirmation
                // comes from a follow-up get-last-error command on the same
                // channel.
                let response = self
                    .run_command(
                        namespace.database(),
                        &Document::new().with("getlasterror", 1),
                    )
                    .await?;
                Ok(WriteResult::acknowledged(response))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await.map_err(|e| {
            QuillError::Transport(format!("failed to close connection to {}: {}", self.address, e))
        })?;
        tracing::debug!(id = %self.id, address = %self.address, "connection closed");
        Ok(())
    }
}
