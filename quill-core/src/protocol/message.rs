//! Outbound request messages.

use std::sync::atomic::{AtomicI32, Ordering};

use bytes::{BufMut, BytesMut};

use super::constants::*;
use crate::document::Document;
use crate::error::{QuillError, Result};
use crate::serialization::Encoder;

/// Global request id counter.
static REQUEST_ID_COUNTER: AtomicI32 = AtomicI32::new(1);

/// Generates a unique message identifier for a request.
pub fn next_request_id() -> i32 {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A fully encoded outbound message: a freshly assigned message identifier
/// bound to its wire bytes.
///
/// The buffer is complete, header included, and is consumed by the
/// connection's send; a message is never reused.
#[derive(Debug)]
pub struct RequestMessage {
    request_id: i32,
    opcode: i32,
    buffer: BytesMut,
}

impl RequestMessage {
    /// Builds a query message against the given full collection name.
    ///
    /// `number_to_return` follows the wire convention: 0 means a default
    /// batch, a negative value means a single batch of at most that many
    /// documents with no cursor left open.
    pub fn query(
        full_collection_name: &str,
        flags: i32,
        number_to_skip: i32,
        number_to_return: i32,
        filter: &Document,
        projection: Option<&Document>,
        encoder: &dyn Encoder<Document>,
    ) -> Result<Self> {
        let mut body = BytesMut::new();
        body.put_i32_le(flags);
        put_cstring(&mut body, full_collection_name)?;
        body.put_i32_le(number_to_skip);
        body.put_i32_le(number_to_return);
        encoder.encode(filter, &mut body)?;
        if let Some(projection) = projection {
            encoder.encode(projection, &mut body)?;
        }
        Ok(Self::from_body(OP_QUERY, body))
    }

    /// Wraps a command document in the unified command protocol: a query
    /// against `<database>.$cmd` returning a single reply document.
    pub fn command(
        database: &str,
        command: &Document,
        encoder: &dyn Encoder<Document>,
    ) -> Result<Self> {
        Self::query(
            &format!("{}.$cmd", database),
            0,
            0,
            -1,
            command,
            None,
            encoder,
        )
    }

    /// Builds a legacy insert message.
    pub fn insert(
        full_collection_name: &str,
        ordered: bool,
        documents: &[Document],
        encoder: &dyn Encoder<Document>,
    ) -> Result<Self> {
        let flags = if ordered {
            0
        } else {
            INSERT_FLAG_CONTINUE_ON_ERROR
        };
        let mut body = BytesMut::new();
        body.put_i32_le(flags);
        put_cstring(&mut body, full_collection_name)?;
        for document in documents {
            encoder.encode(document, &mut body)?;
        }
        Ok(Self::from_body(OP_INSERT, body))
    }

    fn from_body(opcode: i32, body: BytesMut) -> Self {
        let request_id = next_request_id();
        let mut buffer = BytesMut::with_capacity(MESSAGE_HEADER_SIZE + body.len());
        buffer.put_i32_le((MESSAGE_HEADER_SIZE + body.len()) as i32);
        buffer.put_i32_le(request_id);
        buffer.put_i32_le(0); // response_to is unused on requests
        buffer.put_i32_le(opcode);
        buffer.extend_from_slice(&body);
        Self {
            request_id,
            opcode,
            buffer,
        }
    }

    /// Returns the message identifier assigned to this request.
    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    /// Returns the opcode of this request.
    pub fn opcode(&self) -> i32 {
        self.opcode
    }

    /// Returns the complete wire bytes, header included.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the on-wire size of the message.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the message carries no bytes. Never true for a
    /// message built through one of the constructors.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn put_cstring(dst: &mut BytesMut, s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(QuillError::Configuration(format!(
            "collection name must not contain NUL bytes: {:?}",
            s
        )));
    }
    dst.put_slice(s.as_bytes());
    dst.put_u8(0);
    Ok(())
}
