//! Error types for sealed box operations.

use thiserror::Error;

/// Errors from key handling, sealing and opening.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material has the wrong length.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required length in bytes
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Key agreement produced an all-zero secret.
    ///
    /// Happens when the peer public key is a low-order point. Such a key
    /// cannot protect anything, so sealing to it is refused.
    #[error("key agreement was not contributory (low-order public key)")]
    NonContributory,

    /// Encoded sealed box is shorter than its fixed header plus tag.
    #[error("malformed sealed box: {len} bytes is below the minimum of {min}")]
    Malformed {
        /// Actual encoded length
        len: usize,
        /// Minimum valid length
        min: usize,
    },

    /// AEAD encryption rejected the input.
    #[error("encryption failed")]
    EncryptionFailed,

    /// Authentication failed: wrong key or tampered ciphertext.
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// Reason for the failure
        reason: String,
    },
}
