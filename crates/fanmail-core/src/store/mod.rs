//! Local key storage.
//!
//! Trait-based abstraction for persisting this device's key pairs and
//! identity. The trait is synchronous (no async) to keep the storage API
//! simple; durable implementations do their own locking.

mod chaotic;
mod error;
mod memory;

use std::{collections::BTreeSet, sync::Arc};

pub use chaotic::ChaoticKeyStore;
pub use error::StorageError;
use fanmail_crypto::{KeyPair, PrivateKey, PublicKey};
use fanmail_proto::{DeviceId, DirectoryEntry, KeyId};
pub use memory::MemoryKeyStore;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use zeroize::Zeroizing;

/// Lock serializing key rotation for everything sharing one store.
pub type RotationLock = Arc<Mutex<()>>;

/// One key pair held by this device.
///
/// Private key material never leaves local storage.
#[derive(Debug, Clone)]
pub struct KeyRecord {
    /// Identifier published alongside the public key
    pub key_id: KeyId,
    /// The key pair
    pub key_pair: KeyPair,
    /// Wall-clock creation time (ms since Unix epoch)
    pub created_at_ms: u64,
}

impl KeyRecord {
    /// Public half.
    pub fn public_key(&self) -> &PublicKey {
        self.key_pair.public_key()
    }

    /// Private half.
    pub fn private_key(&self) -> &PrivateKey {
        self.key_pair.private_key()
    }

    /// Age at `now_ms`. A creation time in the future counts as age zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at_ms)
    }

    /// Entry as it is published to the key directory.
    pub fn directory_entry(&self) -> DirectoryEntry {
        DirectoryEntry { key_id: self.key_id, public_key: self.public_key().as_bytes().to_vec() }
    }

    /// Encode for durable storage (CBOR).
    pub fn to_stored_bytes(&self) -> Result<Vec<u8>, StorageError> {
        let stored = StoredKeyRecord {
            key_id: self.key_id,
            public_key: self.public_key().as_bytes().to_vec(),
            private_key: Zeroizing::new(self.private_key().as_bytes().to_vec()),
            created_at_ms: self.created_at_ms,
        };

        let mut bytes = Vec::new();
        ciborium::into_writer(&stored, &mut bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Decode from durable storage.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the bytes are not a stored record, or the stored
    ///   public key does not belong to the stored private key
    pub fn from_stored_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let stored: StoredKeyRecord = ciborium::from_reader(bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let private = PrivateKey::from_bytes(&stored.private_key)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let public = PublicKey::from_bytes(&stored.public_key)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        if private.public_key() != public {
            return Err(StorageError::Serialization(format!(
                "stored key pair {} does not match its public key",
                stored.key_id
            )));
        }

        Ok(Self {
            key_id: stored.key_id,
            key_pair: KeyPair::from_parts(public, private),
            created_at_ms: stored.created_at_ms,
        })
    }
}

/// Persisted form of a [`KeyRecord`].
#[derive(Serialize, Deserialize)]
struct StoredKeyRecord {
    key_id: KeyId,
    public_key: Vec<u8>,
    private_key: Zeroizing<Vec<u8>>,
    created_at_ms: u64,
}

/// Storage abstraction for key records and device identity.
///
/// Must be Clone (shared by the lifecycle manager, fan-out and resolver),
/// Send + Sync, and synchronous. Implementations share internal state via
/// Arc, so clones access the same underlying storage.
///
/// Records are never evicted implicitly; [`KeyStore::remove`] is the only way
/// a record disappears.
pub trait KeyStore: Clone + Send + Sync + 'static {
    /// Persist a record and make it the latest.
    ///
    /// # Invariants
    ///
    /// - Post: `get(record.key_id)` returns the record
    /// - Post: `latest()` returns the record (pointer overwritten
    ///   unconditionally)
    /// - Record and pointer are written atomically: on error neither changed
    fn put(&self, record: &KeyRecord) -> Result<(), StorageError>;

    /// Load a record by key id. `None` if this device never held the key or
    /// it was removed.
    fn get(&self, key_id: KeyId) -> Result<Option<KeyRecord>, StorageError>;

    /// Record the latest pointer refers to. `None` before the first `put`.
    fn latest(&self) -> Result<Option<KeyRecord>, StorageError>;

    /// Every key id currently held.
    fn all_key_ids(&self) -> Result<BTreeSet<KeyId>, StorageError>;

    /// Remove a record that is not the latest.
    ///
    /// Returns whether a record was removed.
    ///
    /// # Errors
    ///
    /// - `LatestKey` if `key_id` is the latest record
    fn remove(&self, key_id: KeyId) -> Result<bool, StorageError>;

    /// Persisted device identifier, if one was created.
    fn device_id(&self) -> Result<Option<DeviceId>, StorageError>;

    /// Persist the device identifier.
    fn set_device_id(&self, device_id: DeviceId) -> Result<(), StorageError>;

    /// Rotation lock for this store.
    ///
    /// # Invariants
    ///
    /// - Every clone of a store returns the same lock, so independent
    ///   lifecycle managers over one store rotate one at a time
    fn rotation_lock(&self) -> RotationLock;
}
