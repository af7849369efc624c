//! Key directory for storing and serving published public keys.
//!
//! Keys are indexed by alias, then by device. Each device's most recently
//! registered key supersedes its older ones, so a lookup returns one entry per
//! device, devices in first-registration order. Entries are never mutated.

#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use fanmail_crypto::PublicKey;
use fanmail_proto::{
    Alias, DeviceId, DirectoryEntry, LookupRequest, LookupResponse, RegisterKeyRequest, decode,
    encode,
};

use crate::error::ServiceError;

/// Keys published by one device, oldest first.
#[derive(Debug, Clone)]
struct DeviceKeys {
    device_id: DeviceId,
    entries: Vec<DirectoryEntry>,
}

/// In-memory key directory.
///
/// Thread-safe via Arc<Mutex<_>>. Clone shares the same underlying storage.
#[derive(Clone, Default)]
pub struct KeyDirectory {
    inner: Arc<Mutex<HashMap<Alias, Vec<DeviceKeys>>>>,
}

impl KeyDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a key for `owner`, the authenticated alias.
    ///
    /// Registering a `(device_id, key_id)` pair that is already present is a
    /// no-op.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn register(&self, owner: &Alias, request: RegisterKeyRequest) -> Result<(), ServiceError> {
        PublicKey::from_bytes(&request.public_key)
            .map_err(|e| ServiceError::InvalidPublicKey(e.to_string()))?;

        let mut inner = self.inner.lock().expect("KeyDirectory mutex poisoned");
        let devices = inner.entry(owner.clone()).or_default();

        let device = match devices.iter().position(|d| d.device_id == request.device_id) {
            Some(index) => &mut devices[index],
            None => {
                devices.push(DeviceKeys { device_id: request.device_id, entries: Vec::new() });
                let last = devices.len() - 1;
                &mut devices[last]
            },
        };

        if device.entries.iter().any(|entry| entry.key_id == request.key_id) {
            tracing::debug!(%owner, key_id = %request.key_id, "duplicate key registration");
            return Ok(());
        }

        device.entries.push(DirectoryEntry { key_id: request.key_id, public_key: request.public_key });
        tracing::debug!(
            %owner,
            device_id = %request.device_id,
            key_id = %request.key_id,
            "registered key"
        );

        Ok(())
    }

    /// Latest key of every device of the subject.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn lookup(&self, request: &LookupRequest) -> LookupResponse {
        let inner = self.inner.lock().expect("KeyDirectory mutex poisoned");

        let entries = inner
            .get(&request.subject)
            .map(|devices| {
                devices.iter().filter_map(|device| device.entries.last().cloned()).collect()
            })
            .unwrap_or_default();

        LookupResponse { entries }
    }

    /// Every key the owner ever published, superseded ones included.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn history(&self, owner: &Alias) -> Vec<DirectoryEntry> {
        let inner = self.inner.lock().expect("KeyDirectory mutex poisoned");
        inner
            .get(owner)
            .map(|devices| devices.iter().flat_map(|d| d.entries.iter().cloned()).collect())
            .unwrap_or_default()
    }

    /// Number of devices that published keys for `owner`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn device_count(&self, owner: &Alias) -> usize {
        let inner = self.inner.lock().expect("KeyDirectory mutex poisoned");
        inner.get(owner).map_or(0, Vec::len)
    }

    /// Handle an encoded register request.
    pub fn serve_register(&self, owner: &Alias, request: &[u8]) -> Result<(), ServiceError> {
        let request: RegisterKeyRequest = decode(request)?;
        self.register(owner, request)
    }

    /// Handle an encoded lookup request, returning the encoded response.
    pub fn serve_lookup(&self, request: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let request: LookupRequest = decode(request)?;
        Ok(encode(&self.lookup(&request))?)
    }
}

#[cfg(test)]
mod tests {
    use fanmail_crypto::KeyPair;
    use fanmail_proto::KeyId;

    use super::*;

    fn alias(name: &str) -> Alias {
        Alias::new(name).unwrap()
    }

    fn request(device: u8, key: u8) -> RegisterKeyRequest {
        RegisterKeyRequest {
            device_id: DeviceId::from_random_bytes([device; 16]),
            key_id: KeyId::from_random_bytes([key; 16]),
            public_key: KeyPair::from_seed([key; 32]).public_key().as_bytes().to_vec(),
        }
    }

    fn lookup_ids(directory: &KeyDirectory, subject: &str) -> Vec<KeyId> {
        let response = directory.lookup(&LookupRequest { subject: alias(subject) });
        response.entries.iter().map(|e| e.key_id).collect()
    }

    #[test]
    fn unknown_subject_has_no_entries() {
        let directory = KeyDirectory::new();
        assert!(lookup_ids(&directory, "nobody").is_empty());
    }

    #[test]
    fn newer_key_supersedes_per_device() {
        let directory = KeyDirectory::new();
        let alice = alias("alice");

        directory.register(&alice, request(1, 10)).unwrap();
        directory.register(&alice, request(2, 20)).unwrap();
        directory.register(&alice, request(1, 11)).unwrap();

        // Device 1 keeps its first-registration slot
        let expected =
            vec![KeyId::from_random_bytes([11; 16]), KeyId::from_random_bytes([20; 16])];
        assert_eq!(lookup_ids(&directory, "alice"), expected);
        assert_eq!(directory.history(&alice).len(), 3);
        assert_eq!(directory.device_count(&alice), 2);
    }

    #[test]
    fn duplicate_registration_is_harmless() {
        let directory = KeyDirectory::new();
        let alice = alias("alice");

        directory.register(&alice, request(1, 10)).unwrap();
        directory.register(&alice, request(1, 11)).unwrap();
        directory.register(&alice, request(1, 10)).unwrap();

        // Re-registering an older key does not resurrect it
        assert_eq!(lookup_ids(&directory, "alice"), vec![KeyId::from_random_bytes([11; 16])]);
        assert_eq!(directory.history(&alice).len(), 2);
    }

    #[test]
    fn aliases_are_isolated() {
        let directory = KeyDirectory::new();
        directory.register(&alias("alice"), request(1, 10)).unwrap();

        assert!(lookup_ids(&directory, "bob").is_empty());
    }

    #[test]
    fn malformed_public_key_rejected() {
        let directory = KeyDirectory::new();
        let mut bad = request(1, 10);
        bad.public_key.truncate(5);

        let result = directory.register(&alias("alice"), bad);
        assert!(matches!(result, Err(ServiceError::InvalidPublicKey(_))));
        assert_eq!(directory.device_count(&alias("alice")), 0);
    }

    #[test]
    fn garbage_bytes_rejected() {
        let directory = KeyDirectory::new();
        let result = directory.serve_lookup(&[0xFF, 0x00, 0x13]);
        assert!(matches!(result, Err(ServiceError::Malformed(_))));
    }
}
