//! Inbound reply buffers with deferred body decoding.

use std::fmt;
use std::mem;

use bytes::BytesMut;

use super::header::ReplyHeader;
use crate::document::Document;
use crate::error::{QuillError, Result};
use crate::serialization::{Decoder, DocumentCodec};

type ReclaimFn = Box<dyn FnOnce(BytesMut) + Send>;

/// The raw bytes of one reply, owned until dropped.
///
/// The header is parsed eagerly by the framing layer; the body stays encoded
/// until a caller demands documents, so failure detection never pays for a
/// full body decode. Dropping the buffers releases them exactly once,
/// invoking the reclaim hook if one was installed — this holds on every exit
/// path, including decode failures.
pub struct ResponseBuffers {
    header: ReplyHeader,
    body: BytesMut,
    reclaim: Option<ReclaimFn>,
}

impl ResponseBuffers {
    /// Creates response buffers over an already-parsed header and body.
    pub fn new(header: ReplyHeader, body: BytesMut) -> Self {
        Self {
            header,
            body,
            reclaim: None,
        }
    }

    /// Like [`new`](ResponseBuffers::new), with a hook invoked exactly once
    /// when the buffers are released. Buffer pools use this to take the
    /// storage back.
    pub fn with_reclaim(
        header: ReplyHeader,
        body: BytesMut,
        reclaim: impl FnOnce(BytesMut) + Send + 'static,
    ) -> Self {
        Self {
            header,
            body,
            reclaim: Some(Box::new(reclaim)),
        }
    }

    /// Returns the parsed reply header.
    pub fn header(&self) -> &ReplyHeader {
        &self.header
    }

    /// Verifies the correlation invariant: the reply must answer the request
    /// identified by `request_id`. A mismatch is fatal and must be surfaced
    /// before any body decode is attempted.
    pub fn correlate(&self, request_id: i32) -> Result<()> {
        if self.header.response_to() != request_id {
            return Err(QuillError::Correlation {
                expected: request_id,
                actual: self.header.response_to(),
            });
        }
        Ok(())
    }

    /// Decodes exactly one generic error document from the front of the
    /// body. Used when the header's failure flag is set; the caller's typed
    /// decoder is deliberately bypassed.
    pub fn error_document(&mut self) -> Result<Document> {
        if self.header.number_returned() < 1 {
            return Err(QuillError::Decode(
                "failed reply carried no error document".to_string(),
            ));
        }
        DocumentCodec.decode(&mut self.body)
    }

    /// Decodes the full body as a sequence of `T`, consuming
    /// `number_returned` documents.
    pub fn documents<T>(&mut self, decoder: &dyn Decoder<T>) -> Result<Vec<T>> {
        let count = self.header.number_returned() as usize;
        let mut documents = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            documents.push(decoder.decode(&mut self.body)?);
        }
        Ok(documents)
    }
}

impl Drop for ResponseBuffers {
    fn drop(&mut self) {
        if let Some(reclaim) = self.reclaim.take() {
            reclaim(mem::take(&mut self.body));
        }
    }
}

impl fmt::Debug for ResponseBuffers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBuffers")
            .field("header", &self.header)
            .field("body_len", &self.body.len())
            .field("has_reclaim", &self.reclaim.is_some())
            .finish()
    }
}
