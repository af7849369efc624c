//! Error types for wire encoding and validation.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors from encoding, decoding and validating wire values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// CBOR serialization failed
    #[error("encode failed: {0}")]
    Encode(String),

    /// CBOR deserialization failed (malformed or wrong shape)
    #[error("decode failed: {0}")]
    Decode(String),

    /// Alias is empty after trimming
    #[error("invalid alias: {0:?}")]
    InvalidAlias(String),

    /// Ciphertext text is not valid base64
    #[error("invalid base64 ciphertext: {0}")]
    InvalidBase64(String),
}
