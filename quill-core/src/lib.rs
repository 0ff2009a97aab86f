//! Core wire protocol types for the Quill document database client.

#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod namespace;
pub mod protocol;
pub mod serialization;

pub use document::{Document, Value};
pub use error::{QuillError, Result};
pub use namespace::Namespace;
pub use protocol::{MessageCodec, ReplyHeader, RequestMessage, ResponseBuffers};
pub use serialization::{Decoder, DocumentCodec, Encoder};
