//! Wire message types for the Quill client protocol.

pub mod constants;

mod codec;
mod header;
mod message;
mod reply;

pub use codec::MessageCodec;
pub use header::ReplyHeader;
pub use message::{next_request_id, RequestMessage};
pub use reply::ResponseBuffers;
