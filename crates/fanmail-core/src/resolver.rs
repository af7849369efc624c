//! Decryption resolution.
//!
//! A bundle carries one ciphertext per key that was a target at send time.
//! This device may hold any subset of those keys (including retired ones), so
//! the resolver walks the entries in bundle order and returns the first one
//! that opens. Failures on individual entries are routine after rotation and
//! are only logged.

use fanmail_crypto::{SealedBox, open};
use fanmail_proto::{Alias, CipherEntry, MessageBundle};

use crate::{
    error::ResolveError,
    store::{KeyStore, StorageError},
    transport::MessageTransport,
};

/// Text shown in place of a message no local key can open.
pub const UNREADABLE_PLACEHOLDER: &str = "[unable to decrypt message]";

/// Outcome of resolving one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Recovered plaintext
    Plaintext(String),
    /// No entry could be opened with a locally held key
    Unreadable,
}

impl Resolution {
    /// Text to display: the plaintext, or [`UNREADABLE_PLACEHOLDER`].
    pub fn display_text(&self) -> &str {
        match self {
            Self::Plaintext(text) => text,
            Self::Unreadable => UNREADABLE_PLACEHOLDER,
        }
    }

    /// Whether a plaintext was recovered.
    pub fn is_readable(&self) -> bool {
        matches!(self, Self::Plaintext(_))
    }
}

/// One message in a fetched conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Alias that sent the message
    pub sender: Alias,
    /// Decryption outcome
    pub resolution: Resolution,
}

/// Result of trying one cipher entry. Never leaves this module.
enum Attempt {
    Opened(String),
    NotHeld,
    Failed(String),
}

/// Opens incoming bundles with locally held keys.
#[derive(Clone)]
pub struct DecryptionResolver<S, T> {
    store: S,
    transport: T,
}

impl<S, T> DecryptionResolver<S, T>
where
    S: KeyStore,
    T: MessageTransport,
{
    /// Create a resolver reading keys from `store` and bundles from
    /// `transport`.
    pub fn new(store: S, transport: T) -> Self {
        Self { store, transport }
    }

    /// Recover the plaintext of `bundle`.
    ///
    /// Entries are tried in bundle order; the first success is returned and
    /// later entries are not attempted. Only storage failures are errors.
    pub fn resolve(&self, bundle: &MessageBundle) -> Result<Resolution, StorageError> {
        for entry in &bundle.ciphers {
            match self.try_entry(entry)? {
                Attempt::Opened(plaintext) => return Ok(Resolution::Plaintext(plaintext)),
                Attempt::NotHeld => {},
                Attempt::Failed(reason) => {
                    tracing::debug!(
                        key_id = %entry.key_id,
                        sender = %bundle.sender,
                        %reason,
                        "cipher entry did not open"
                    );
                },
            }
        }

        Ok(Resolution::Unreadable)
    }

    /// Fetch the conversation with `subject` and resolve every bundle, in
    /// transport order.
    pub async fn fetch_conversation(
        &self,
        subject: &Alias,
    ) -> Result<Vec<ReceivedMessage>, ResolveError> {
        let bundles = self.transport.fetch(subject).await.map_err(|err| {
            tracing::warn!(%subject, error = %err, "conversation fetch failed");
            ResolveError::TransportUnavailable(err)
        })?;

        bundles
            .iter()
            .map(|bundle| {
                Ok(ReceivedMessage {
                    sender: bundle.sender.clone(),
                    resolution: self.resolve(bundle)?,
                })
            })
            .collect()
    }

    fn try_entry(&self, entry: &CipherEntry) -> Result<Attempt, StorageError> {
        let Some(record) = self.store.get(entry.key_id)? else {
            return Ok(Attempt::NotHeld);
        };

        let bytes = match entry.sealed_bytes() {
            Ok(bytes) => bytes,
            Err(err) => return Ok(Attempt::Failed(err.to_string())),
        };
        let plaintext = match SealedBox::from_bytes(&bytes)
            .and_then(|sealed| open(record.private_key(), &sealed))
        {
            Ok(plaintext) => plaintext,
            Err(err) => return Ok(Attempt::Failed(err.to_string())),
        };

        Ok(match String::from_utf8(plaintext) {
            Ok(text) => Attempt::Opened(text),
            Err(_) => Attempt::Failed("plaintext is not UTF-8".to_string()),
        })
    }
}
