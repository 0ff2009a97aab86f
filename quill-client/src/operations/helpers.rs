//! Shared execution machinery: protocol-path selection, the wrapped command
//! protocol, and failure classification.

use std::net::SocketAddr;

use quill_core::{Document, DocumentCodec, QuillError, RequestMessage, Result};

use crate::connection::{Connection, ServerDescription, ServerVersion, WriteResult};

/// First server version that speaks the unified command protocol.
const COMMAND_PROTOCOL_MINIMUM: ServerVersion = ServerVersion::new(2, 6, 0);

/// The wire protocol path an operation will take, resolved once per
/// operation from the connection's server description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolPath {
    /// The unified command protocol.
    Command,
    /// The legacy write protocol against system collections.
    LegacyWrite,
}

/// Selects the protocol path for a server. Pure; identical inputs always
/// yield identical decisions, so every execution form of one operation
/// branches the same way.
pub fn protocol_path(description: &ServerDescription) -> ProtocolPath {
    if description.version() >= COMMAND_PROTOCOL_MINIMUM {
        ProtocolPath::Command
    } else {
        ProtocolPath::LegacyWrite
    }
}

/// Runs a command document through the wrapped command protocol and returns
/// the reply document.
///
/// A set failure flag or a non-ok reply both surface as
/// [`QuillError::Protocol`] carrying the server's document verbatim.
pub(crate) async fn execute_command(
    connection: &mut dyn Connection,
    database: &str,
    command: &Document,
) -> Result<Document> {
    let message = RequestMessage::command(database, command, &DocumentCodec)?;
    let request_id = message.request_id();
    let address = connection.address();

    let mut buffers = connection.send_and_receive(message).await?;
    buffers.correlate(request_id)?;
    if buffers.header().is_query_failure() {
        let error = buffers.error_document()?;
        return Err(QuillError::Protocol { address, error });
    }

    let reply = buffers
        .documents(&DocumentCodec)?
        .into_iter()
        .next()
        .ok_or_else(|| QuillError::Decode("command reply carried no document".to_string()))?;
    if !command_ok(&reply) {
        return Err(QuillError::Protocol {
            address,
            error: reply,
        });
    }
    Ok(reply)
}

/// True if a command reply document reports success.
fn command_ok(reply: &Document) -> bool {
    match reply.get("ok") {
        Some(value) => value.as_f64() == Some(1.0) || value == &quill_core::Value::Bool(true),
        None => false,
    }
}

/// Converges a legacy write result into the command-path error shape: a
/// reported write error becomes [`QuillError::Protocol`] with the server's
/// acknowledgment document.
pub(crate) fn check_write_result(result: &WriteResult, address: SocketAddr) -> Result<()> {
    match result.error_document() {
        Some(error) => Err(QuillError::Protocol {
            address,
            error: error.clone(),
        }),
        None => Ok(()),
    }
}
