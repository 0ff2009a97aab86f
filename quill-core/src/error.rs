//! Error types for Quill client operations.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::document::Document;

/// The main error type for Quill client operations.
#[derive(Debug, Error)]
pub enum QuillError {
    /// The binding could not supply a connection (pool exhausted, timeout,
    /// no eligible server).
    #[error("connection acquisition failed: {0}")]
    Acquisition(String),

    /// Send or receive failed below the protocol layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server explicitly reported failure through the reply header or
    /// command result. Carries the server-provided error document verbatim.
    #[error("server {address} reported failure: {error}")]
    Protocol {
        /// Address of the server that reported the failure.
        address: SocketAddr,
        /// The error document exactly as the server returned it.
        error: Document,
    },

    /// A reply's message identifier did not match the originating request.
    /// Fatal; indicates a protocol desynchronization.
    #[error("reply correlates to request {actual}, expected {expected}")]
    Correlation {
        /// The identifier of the request that was sent.
        expected: i32,
        /// The identifier the reply echoed back.
        actual: i32,
    },

    /// Payload bytes did not conform to the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid client-side configuration or request parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized `Result` type for Quill client operations.
pub type Result<T> = std::result::Result<T, QuillError>;
