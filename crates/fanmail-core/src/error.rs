//! Error types for the Fanmail messaging core.
//!
//! One enum per layer: collaborator errors (directory, transport), key
//! lifecycle errors, and the send/receive errors surfaced to callers.
//! Per-entry decryption failures never appear here; the resolver logs and
//! skips them.

use fanmail_crypto::CryptoError;
use fanmail_proto::{Alias, KeyId, ProtocolError};
use thiserror::Error;

use crate::store::StorageError;

/// Errors from the key directory collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Directory could not be reached
    #[error("key directory unavailable: {0}")]
    Unavailable(String),

    /// Directory answered with a non-success status
    #[error("key directory rejected request: {reason}")]
    Rejected {
        /// Reason given by the directory
        reason: String,
    },
}

impl DirectoryError {
    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// Rejections are never transient: repeating the same request gets the
    /// same answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Malformed directory traffic is a rejection, not an outage.
impl From<ProtocolError> for DirectoryError {
    fn from(err: ProtocolError) -> Self {
        Self::Rejected { reason: err.to_string() }
    }
}

/// Errors from the message transport collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Transport could not be reached
    #[error("message transport unavailable: {0}")]
    Unavailable(String),

    /// Transport answered with a non-success status
    #[error("message transport rejected request: {reason}")]
    Rejected {
        /// Reason given by the transport
        reason: String,
    },
}

impl TransportError {
    /// Returns true if this error is transient and may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<ProtocolError> for TransportError {
    fn from(err: ProtocolError) -> Self {
        Self::Rejected { reason: err.to_string() }
    }
}

/// Errors from key rotation.
///
/// After any of these the local store is exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Registering the new public key failed; the new key was discarded
    #[error("key rotation failed: {0}")]
    RotationFailed(#[source] DirectoryError),

    /// Local key storage failed
    #[error("key storage failed during rotation: {0}")]
    Storage(#[from] StorageError),
}

impl LifecycleError {
    /// Returns true if a later retry may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RotationFailed(err) => err.is_transient(),
            Self::Storage(StorageError::Io(_)) => true,
            Self::Storage(_) => false,
        }
    }
}

/// Errors from sending a message. Nothing is submitted when any is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// No local key exists; key lifecycle must run before the first send
    #[error("no local key; ensure a fresh key before sending")]
    NoLocalKey,

    /// Recipient has published no keys
    #[error("recipient {recipient} has no published keys")]
    NoRecipientKeys {
        /// Alias that was looked up
        recipient: Alias,
    },

    /// Sealing to one target failed, so the whole send was aborted
    #[error("encryption to key {key_id} failed")]
    PartialEncryptionFailure {
        /// Target whose encryption failed
        key_id: KeyId,
        /// Underlying cryptographic error
        source: CryptoError,
    },

    /// Recipient lookup failed
    #[error("key directory unavailable: {0}")]
    DirectoryUnavailable(#[source] DirectoryError),

    /// Bundle submission failed
    #[error("message transport unavailable: {0}")]
    TransportUnavailable(#[source] TransportError),

    /// Local key storage failed
    #[error("key storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl SendError {
    /// Returns true if resending the same message may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::DirectoryUnavailable(err) => err.is_transient(),
            Self::TransportUnavailable(err) => err.is_transient(),
            Self::Storage(StorageError::Io(_)) => true,
            _ => false,
        }
    }
}

/// Errors from fetching and resolving a conversation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Fetching bundles failed
    #[error("message transport unavailable: {0}")]
    TransportUnavailable(#[source] TransportError),

    /// Local key storage failed
    #[error("key storage failed: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailability_is_transient() {
        assert!(DirectoryError::Unavailable("down".into()).is_transient());
        assert!(!DirectoryError::Rejected { reason: "nope".into() }.is_transient());
        assert!(TransportError::Unavailable("down".into()).is_transient());

        let send = SendError::TransportUnavailable(TransportError::Unavailable("down".into()));
        assert!(send.is_transient());
        assert!(!SendError::NoLocalKey.is_transient());
    }

    #[test]
    fn rotation_failure_inherits_transience() {
        let transient = LifecycleError::RotationFailed(DirectoryError::Unavailable("x".into()));
        let fatal = LifecycleError::RotationFailed(DirectoryError::Rejected { reason: "x".into() });

        assert!(transient.is_transient());
        assert!(!fatal.is_transient());
        assert!(!LifecycleError::Storage(StorageError::LatestKey).is_transient());
    }

    #[test]
    fn protocol_errors_become_rejections() {
        let err: DirectoryError = ProtocolError::Decode("truncated".into()).into();
        assert!(matches!(err, DirectoryError::Rejected { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn messages_name_the_recipient() {
        let err = SendError::NoRecipientKeys { recipient: Alias::new("alice").unwrap() };
        assert_eq!(err.to_string(), "recipient alice has no published keys");
    }
}
