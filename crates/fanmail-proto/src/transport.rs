//! Message transport messages.
//!
//! One logical message travels as a [`MessageBundle`]: the same plaintext
//! sealed once per target public key. The transport stores and returns bundles
//! without looking inside them.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    errors::ProtocolError,
    ids::{Alias, KeyId},
};

/// Ciphertext produced for one public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherEntry {
    /// Key the ciphertext was sealed to
    pub key_id: KeyId,
    /// Base64 text of the sealed box bytes
    pub cipher_text: String,
}

impl CipherEntry {
    /// Wrap raw sealed box bytes as base64 text.
    pub fn from_sealed(key_id: KeyId, sealed: &[u8]) -> Self {
        Self { key_id, cipher_text: STANDARD.encode(sealed) }
    }

    /// Raw sealed box bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidBase64` if the text was corrupted in transit
    pub fn sealed_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        STANDARD.decode(&self.cipher_text).map_err(|e| ProtocolError::InvalidBase64(e.to_string()))
    }
}

/// One logical message, sealed to every target key known at send time.
///
/// Immutable once created. Entry order is self key first, then recipient keys
/// in directory order; the order carries no meaning beyond interoperability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBundle {
    /// Alias that sent the message
    pub sender: Alias,
    /// One entry per target key
    pub ciphers: Vec<CipherEntry>,
}

impl MessageBundle {
    /// Key ids in bundle order.
    pub fn key_ids(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.ciphers.iter().map(|entry| entry.key_id)
    }
}

/// Hand a bundle to the transport. The sender is the authenticated alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Alias the message is addressed to
    pub recipient: Alias,
    /// Sealed copies
    pub ciphers: Vec<CipherEntry>,
}

/// Ask for the conversation with a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Other party of the conversation
    pub subject: Alias,
}

/// Bundles in the conversation with the subject.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    /// Bundles in transport order. Absent or null decodes as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<MessageBundle>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
