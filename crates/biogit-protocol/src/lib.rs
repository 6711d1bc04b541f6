//! Wire protocol for biogit push/fetch/clone.
//!
//! Every message on the wire is a 6-byte header — `u16` message id and
//! `u32` body length, both big-endian — followed by the body. Requests in
//! the authenticated range carry a nul-terminated token prefix inside the
//! body; the remainder is the typed payload.

mod frame;
mod message;
mod token;

pub use frame::{FrameReader, FrameWriter, RawFrame, FRAME_HEADER_LEN, MAX_BODY_LEN};
pub use message::{Message, MsgId, RefValue};
pub use token::{TokenError, TokenSigner, DEFAULT_TOKEN_LIFETIME_SECS};

/// Errors from protocol encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown message id {0}")]
    UnknownMessageId(u16),

    #[error("declared body length {0} exceeds the 64 MiB cap")]
    BodyTooLarge(u32),

    #[error("malformed {msg} payload: {reason}")]
    Malformed { msg: &'static str, reason: String },

    #[error("connection closed mid-frame")]
    Truncated,

    #[error(transparent)]
    Hash(#[from] biogit_hash::HashError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
