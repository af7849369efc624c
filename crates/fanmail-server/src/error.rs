//! Service error types.

use fanmail_core::{DirectoryError, TransportError};
use fanmail_proto::ProtocolError;
use thiserror::Error;

/// Errors returned by the reference services.
///
/// Every variant is a rejection of the request: the services are in-process,
/// so they are never unavailable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Request or response bytes did not match the wire contract
    #[error("malformed request: {0}")]
    Malformed(#[from] ProtocolError),

    /// Published key is not a valid public key
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Submitted bundle carries no ciphertexts
    #[error("bundle has no cipher entries")]
    EmptyBundle,
}

impl From<ServiceError> for DirectoryError {
    fn from(err: ServiceError) -> Self {
        Self::Rejected { reason: err.to_string() }
    }
}

impl From<ServiceError> for TransportError {
    fn from(err: ServiceError) -> Self {
        Self::Rejected { reason: err.to_string() }
    }
}
