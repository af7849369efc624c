//! Redb-backed durable key store.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. A key
//! record and the latest pointer are written in the same transaction, so a
//! crash mid-rotation leaves either both or neither.

use std::{collections::BTreeSet, path::Path, sync::Arc};

use fanmail_core::{KeyRecord, KeyStore, RotationLock, StorageError};
use fanmail_proto::{DeviceId, KeyId};
use redb::{Database, ReadableTable, TableDefinition};

/// Table: keys
/// Key: key_id as raw UUID bytes [16 bytes]
/// Value: CBOR-encoded key record (public and private halves)
const KEYS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("keys");

/// Table: meta
/// Key: slot name
/// Value: raw UUID bytes [16 bytes]
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Slot holding the latest key id.
const LATEST: &str = "latest";

/// Slot holding the device id.
const DEVICE_ID: &str = "device_id";

/// Durable key store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc) and
/// clones share the rotation lock. Redb refuses to open one file twice in a
/// process, so cloning is the only way to share a store.
#[derive(Clone)]
pub struct RedbKeyStore {
    db: Arc<Database>,
    rotation: RotationLock,
}

impl RedbKeyStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the `keys` and `meta` tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(KEYS).map_err(|e| StorageError::Io(e.to_string()))?;
            let _ = txn.open_table(META).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db), rotation: RotationLock::default() })
    }

    fn read_slot(&self, slot: &str) -> Result<Option<[u8; 16]>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(META).map_err(|e| StorageError::Io(e.to_string()))?;

        match table.get(slot).map_err(|e| StorageError::Io(e.to_string()))? {
            Some(value) => decode_uuid(value.value()).map(Some),
            None => Ok(None),
        }
    }
}

fn decode_uuid(bytes: &[u8]) -> Result<[u8; 16], StorageError> {
    <[u8; 16]>::try_from(bytes).map_err(|_| {
        StorageError::Serialization(format!("expected 16-byte identifier, got {}", bytes.len()))
    })
}

impl KeyStore for RedbKeyStore {
    fn put(&self, record: &KeyRecord) -> Result<(), StorageError> {
        let bytes = record.to_stored_bytes()?;
        let key = record.key_id.as_bytes();

        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut keys = txn.open_table(KEYS).map_err(|e| StorageError::Io(e.to_string()))?;
            keys.insert(key.as_slice(), bytes.as_slice())
                .map_err(|e| StorageError::Io(e.to_string()))?;

            let mut meta = txn.open_table(META).map_err(|e| StorageError::Io(e.to_string()))?;
            meta.insert(LATEST, key.as_slice()).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    fn get(&self, key_id: KeyId) -> Result<Option<KeyRecord>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(KEYS).map_err(|e| StorageError::Io(e.to_string()))?;

        let key = key_id.as_bytes();
        match table.get(key.as_slice()).map_err(|e| StorageError::Io(e.to_string()))? {
            Some(value) => KeyRecord::from_stored_bytes(value.value()).map(Some),
            None => Ok(None),
        }
    }

    fn latest(&self) -> Result<Option<KeyRecord>, StorageError> {
        let Some(latest) = self.read_slot(LATEST)? else {
            return Ok(None);
        };

        let key_id = KeyId::from_bytes(latest);
        match self.get(key_id)? {
            Some(record) => Ok(Some(record)),
            None => Err(StorageError::Serialization(format!(
                "latest pointer refers to missing key {key_id}"
            ))),
        }
    }

    fn all_key_ids(&self) -> Result<BTreeSet<KeyId>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(KEYS).map_err(|e| StorageError::Io(e.to_string()))?;

        let mut ids = BTreeSet::new();
        for result in table.iter().map_err(|e| StorageError::Io(e.to_string()))? {
            let (key, _) = result.map_err(|e| StorageError::Io(e.to_string()))?;
            ids.insert(KeyId::from_bytes(decode_uuid(key.value())?));
        }

        Ok(ids)
    }

    fn remove(&self, key_id: KeyId) -> Result<bool, StorageError> {
        let key = key_id.as_bytes();

        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        let meta = txn.open_table(META).map_err(|e| StorageError::Io(e.to_string()))?;
        let is_latest = meta
            .get(LATEST)
            .map_err(|e| StorageError::Io(e.to_string()))?
            .is_some_and(|value| value.value() == key.as_slice());
        if is_latest {
            return Err(StorageError::LatestKey);
        }

        let mut keys = txn.open_table(KEYS).map_err(|e| StorageError::Io(e.to_string()))?;
        let removed =
            keys.remove(key.as_slice()).map_err(|e| StorageError::Io(e.to_string()))?.is_some();

        drop(keys);
        drop(meta);
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(removed)
    }

    fn device_id(&self) -> Result<Option<DeviceId>, StorageError> {
        Ok(self.read_slot(DEVICE_ID)?.map(DeviceId::from_bytes))
    }

    fn set_device_id(&self, device_id: DeviceId) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut meta = txn.open_table(META).map_err(|e| StorageError::Io(e.to_string()))?;
            meta.insert(DEVICE_ID, device_id.as_bytes().as_slice())
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    fn rotation_lock(&self) -> RotationLock {
        Arc::clone(&self.rotation)
    }
}
