/// Errors produced by hash parsing and computation.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid hex length: expected {expected}, got {actual}")]
    InvalidHexLength { expected: usize, actual: usize },

    #[error("invalid hex character {byte:#x} at offset {offset}")]
    InvalidHex { byte: u8, offset: usize },

    #[error("SHA-1 collision attack detected")]
    Sha1Collision,
}
