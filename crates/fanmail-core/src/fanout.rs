//! Encryption fan-out.
//!
//! One logical message is sealed independently to every public key that must
//! be able to read it: this device's latest key first, then each key the
//! directory lists for the recipient. Fan-out is all-or-nothing; if any
//! target cannot be sealed to, nothing is submitted.

use std::collections::HashSet;

use fanmail_crypto::{PublicKey, seal};
use fanmail_proto::{Alias, CipherEntry, DirectoryEntry, KeyId, MessageBundle, SubmitRequest};

use crate::{
    directory::DirectoryClient,
    env::Environment,
    error::SendError,
    store::KeyStore,
    transport::MessageTransport,
};

/// Fan-out configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanoutConfig {
    /// Also seal to the sender's other devices, as listed by the directory
    /// under the sender's own alias. Off by default.
    pub include_own_devices: bool,
}

/// Seals outgoing messages for every target key and submits the bundle.
#[derive(Clone)]
pub struct EncryptionFanout<E, S, D, T> {
    env: E,
    store: S,
    directory: D,
    transport: T,
    sender: Alias,
    config: FanoutConfig,
}

impl<E, S, D, T> EncryptionFanout<E, S, D, T>
where
    E: Environment,
    S: KeyStore,
    D: DirectoryClient,
    T: MessageTransport,
{
    /// Create a fan-out for messages sent as `sender`.
    pub fn new(
        env: E,
        store: S,
        directory: D,
        transport: T,
        sender: Alias,
        config: FanoutConfig,
    ) -> Self {
        Self { env, store, directory, transport, sender, config }
    }

    /// Alias messages are sent as.
    pub fn sender(&self) -> &Alias {
        &self.sender
    }

    /// Seal `plaintext` to every target key and submit it to `recipient`.
    ///
    /// # Invariants
    ///
    /// - Post (Ok): the bundle holds one entry per distinct target key, self
    ///   key first, then recipient keys in directory order
    /// - Post (Err): nothing was submitted
    pub async fn send(
        &self,
        plaintext: &str,
        recipient: &Alias,
    ) -> Result<MessageBundle, SendError> {
        let recipient_entries = self.directory.lookup(recipient).await.map_err(|err| {
            tracing::warn!(%recipient, error = %err, "recipient lookup failed");
            SendError::DirectoryUnavailable(err)
        })?;

        let own_record = self.store.latest()?.ok_or(SendError::NoLocalKey)?;

        if recipient_entries.is_empty() {
            return Err(SendError::NoRecipientKeys { recipient: recipient.clone() });
        }

        let own_devices = if self.config.include_own_devices && recipient != &self.sender {
            self.directory
                .lookup(&self.sender)
                .await
                .map_err(SendError::DirectoryUnavailable)?
        } else {
            Vec::new()
        };

        let targets = target_set(
            own_record.directory_entry(),
            recipient_entries.into_iter().chain(own_devices),
        );

        let ciphers = targets
            .iter()
            .map(|target| self.seal_to(target, plaintext.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;

        debug_assert_eq!(ciphers.len(), targets.len());

        self.transport
            .submit(SubmitRequest { recipient: recipient.clone(), ciphers: ciphers.clone() })
            .await
            .map_err(|err| {
                tracing::warn!(%recipient, error = %err, "bundle submission failed");
                SendError::TransportUnavailable(err)
            })?;

        tracing::info!(%recipient, targets = ciphers.len(), "sent message");

        Ok(MessageBundle { sender: self.sender.clone(), ciphers })
    }

    fn seal_to(&self, target: &DirectoryEntry, plaintext: &[u8]) -> Result<CipherEntry, SendError> {
        let failure = |source| SendError::PartialEncryptionFailure { key_id: target.key_id, source };

        let public_key = PublicKey::from_bytes(&target.public_key).map_err(failure)?;
        let sealed = seal(&public_key, plaintext, self.env.random_array(), self.env.random_array())
            .map_err(failure)?;

        Ok(CipherEntry::from_sealed(target.key_id, &sealed.to_bytes()))
    }
}

/// Own entry first, then `others` in order, dropping repeated key ids.
fn target_set(
    own: DirectoryEntry,
    others: impl IntoIterator<Item = DirectoryEntry>,
) -> Vec<DirectoryEntry> {
    let mut seen: HashSet<KeyId> = HashSet::new();
    std::iter::once(own).chain(others).filter(|entry| seen.insert(entry.key_id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(seed: u8) -> DirectoryEntry {
        DirectoryEntry { key_id: KeyId::from_random_bytes([seed; 16]), public_key: vec![seed; 32] }
    }

    #[test]
    fn own_entry_comes_first() {
        let targets = target_set(entry(9), vec![entry(1), entry(2)]);
        let seeds: Vec<u8> = targets.iter().map(|t| t.public_key[0]).collect();
        assert_eq!(seeds, vec![9, 1, 2]);
    }

    #[test]
    fn repeated_key_ids_dropped() {
        // Self appears in the directory listing and a row is duplicated
        let targets = target_set(entry(9), vec![entry(1), entry(9), entry(1), entry(2)]);
        let seeds: Vec<u8> = targets.iter().map(|t| t.public_key[0]).collect();
        assert_eq!(seeds, vec![9, 1, 2]);
    }

    #[test]
    fn empty_directory_yields_only_self() {
        assert_eq!(target_set(entry(3), Vec::new()).len(), 1);
    }
}
