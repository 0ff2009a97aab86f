//! Reply header parsing.

use bytes::{Buf, BytesMut};

use super::constants::*;
use crate::error::{QuillError, Result};

/// The eagerly parsed header of one server reply.
///
/// The executor consumes three logical fields: the echoed request identifier
/// (`response_to`), the failure flag, and the document count. The remaining
/// fields ride along for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    message_length: i32,
    request_id: i32,
    response_to: i32,
    response_flags: i32,
    cursor_id: i64,
    starting_from: i32,
    number_returned: i32,
}

impl ReplyHeader {
    /// Assembles a header from its logical fields.
    pub fn new(
        request_id: i32,
        response_to: i32,
        response_flags: i32,
        cursor_id: i64,
        starting_from: i32,
        number_returned: i32,
    ) -> Self {
        Self {
            message_length: REPLY_HEADER_SIZE as i32,
            request_id,
            response_to,
            response_flags,
            cursor_id,
            starting_from,
            number_returned,
        }
    }

    /// Parses a header from the front of `src`, consuming exactly
    /// [`REPLY_HEADER_SIZE`] bytes.
    pub fn read_from(src: &mut BytesMut) -> Result<Self> {
        if src.len() < REPLY_HEADER_SIZE {
            return Err(QuillError::Decode(format!(
                "reply header truncated: {} of {} bytes",
                src.len(),
                REPLY_HEADER_SIZE
            )));
        }

        let message_length = src.get_i32_le();
        let request_id = src.get_i32_le();
        let response_to = src.get_i32_le();
        let opcode = src.get_i32_le();
        if opcode != OP_REPLY {
            return Err(QuillError::Decode(format!(
                "expected reply opcode {}, got {}",
                OP_REPLY, opcode
            )));
        }

        let response_flags = src.get_i32_le();
        let cursor_id = src.get_i64_le();
        let starting_from = src.get_i32_le();
        let number_returned = src.get_i32_le();
        if number_returned < 0 {
            return Err(QuillError::Decode(format!(
                "negative document count in reply: {}",
                number_returned
            )));
        }

        Ok(Self {
            message_length,
            request_id,
            response_to,
            response_flags,
            cursor_id,
            starting_from,
            number_returned,
        })
    }

    /// The server-assigned identifier of the reply itself.
    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    /// The identifier of the request this reply answers.
    pub fn response_to(&self) -> i32 {
        self.response_to
    }

    /// The cursor left open on the server, or 0.
    pub fn cursor_id(&self) -> i64 {
        self.cursor_id
    }

    /// Position of the first returned document within the cursor.
    pub fn starting_from(&self) -> i32 {
        self.starting_from
    }

    /// Number of documents in the reply body.
    pub fn number_returned(&self) -> i32 {
        self.number_returned
    }

    /// True if the server failed the request; the body then carries a single
    /// error document.
    pub fn is_query_failure(&self) -> bool {
        self.response_flags & REPLY_FLAG_QUERY_FAILURE != 0
    }

    /// True if the requested cursor no longer exists on the server.
    pub fn is_cursor_not_found(&self) -> bool {
        self.response_flags & REPLY_FLAG_CURSOR_NOT_FOUND != 0
    }
}
