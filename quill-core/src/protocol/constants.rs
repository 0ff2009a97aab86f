//! Wire-level constants for the Quill client protocol.

/// Size of the common message header: length, request id, response-to, opcode.
pub const MESSAGE_HEADER_SIZE: usize = 16;

/// Size of a full reply header: the message header plus response flags,
/// cursor id, starting-from, and number-returned.
pub const REPLY_HEADER_SIZE: usize = 36;

/// Upper bound on a single message, enforced when framing replies.
pub const MAX_MESSAGE_SIZE: usize = 48 * 1024 * 1024;

/// Opcode of a server reply.
pub const OP_REPLY: i32 = 1;

/// Opcode of a legacy insert request.
pub const OP_INSERT: i32 = 2002;

/// Opcode of a query request. Commands ride on this opcode against the
/// database's `$cmd` collection.
pub const OP_QUERY: i32 = 2004;

/// Query flag permitting execution on a non-primary server.
pub const QUERY_FLAG_SECONDARY_OK: i32 = 1 << 2;

/// Insert flag requesting that the server keep going past individual
/// document failures. Cleared for ordered inserts.
pub const INSERT_FLAG_CONTINUE_ON_ERROR: i32 = 1;

/// Reply flag set when the requested cursor no longer exists.
pub const REPLY_FLAG_CURSOR_NOT_FOUND: i32 = 1;

/// Reply flag set when the server failed the request; the body then holds a
/// single error document instead of results.
pub const REPLY_FLAG_QUERY_FAILURE: i32 = 1 << 1;
