//! Codec for framing requests out and complete replies in.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use super::constants::*;
use super::header::ReplyHeader;
use super::message::RequestMessage;
use super::reply::ResponseBuffers;
use crate::error::{QuillError, Result};

/// Codec for the Quill client wire protocol.
///
/// Implements the `tokio_util::codec::{Encoder, Decoder}` traits for use
/// with tokio's framed I/O. Decoding yields one [`ResponseBuffers`] per
/// complete reply, with the header parsed and the body left encoded.
#[derive(Debug, Default)]
pub struct MessageCodec;

impl MessageCodec {
    /// Creates a new codec instance.
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<RequestMessage> for MessageCodec {
    type Error = QuillError;

    fn encode(&mut self, item: RequestMessage, dst: &mut BytesMut) -> Result<()> {
        if item.is_empty() {
            return Err(QuillError::Decode(
                "cannot encode empty message".to_string(),
            ));
        }
        dst.extend_from_slice(item.bytes());
        Ok(())
    }
}

impl Decoder for MessageCodec {
    type Item = ResponseBuffers;
    type Error = QuillError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < 4 {
            return Ok(None);
        }

        let message_length = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        if (message_length as usize) < REPLY_HEADER_SIZE
            || message_length as usize > MAX_MESSAGE_SIZE
        {
            return Err(QuillError::Decode(format!(
                "invalid reply length {}",
                message_length
            )));
        }

        let message_length = message_length as usize;
        if src.len() < message_length {
            src.reserve(message_length - src.len());
            return Ok(None);
        }

        let mut message = src.split_to(message_length);
        let header = ReplyHeader::read_from(&mut message)?;
        Ok(Some(ResponseBuffers::new(header, message)))
    }
}
