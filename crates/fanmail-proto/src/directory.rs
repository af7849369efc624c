//! Key directory messages.
//!
//! The directory maps an alias to the public keys its devices have published.
//! Entries are immutable once published: rotation publishes a new entry under
//! a new key id rather than overwriting the old one.

use serde::{Deserialize, Serialize};

use crate::ids::{Alias, DeviceId, KeyId};

/// One published public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    /// Key identifier chosen by the publishing device
    pub key_id: KeyId,
    /// Encoded public key bytes (32-byte X25519 key for honest publishers)
    pub public_key: Vec<u8>,
}

/// Publish a device's new public key.
///
/// The alias is taken from the authenticated channel, not from the request.
/// Success carries no body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterKeyRequest {
    /// Publishing device
    pub device_id: DeviceId,
    /// Identifier of the new key
    pub key_id: KeyId,
    /// Encoded public key bytes
    pub public_key: Vec<u8>,
}

/// Ask for the keys currently published by a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    /// Alias whose keys are requested
    pub subject: Alias,
}

/// Keys currently published by the subject, in directory order.
///
/// May be empty when the subject has not published anything yet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LookupResponse {
    /// Published entries
    #[serde(default)]
    pub entries: Vec<DirectoryEntry>,
}
