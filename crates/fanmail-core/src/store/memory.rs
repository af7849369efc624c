use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex, MutexGuard},
};

use fanmail_proto::{DeviceId, KeyId};

use super::{KeyRecord, KeyStore, RotationLock, StorageError};

/// In-memory key store for testing and simulation
///
/// All state sits behind one Arc<Mutex<>>, so a record and the latest pointer
/// change together and clones share the same keys. A poisoned mutex surfaces
/// as `StorageError::Io` instead of a panic.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    inner: Arc<Mutex<MemoryKeyStoreInner>>,
    rotation: RotationLock,
}

#[derive(Default)]
struct MemoryKeyStoreInner {
    records: HashMap<KeyId, KeyRecord>,
    latest: Option<KeyId>,
    device_id: Option<DeviceId>,
}

impl MemoryKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.records.len())
    }

    /// Whether no record is held.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryKeyStoreInner>, StorageError> {
        self.inner.lock().map_err(|_| StorageError::Io("key store mutex poisoned".to_string()))
    }
}

impl KeyStore for MemoryKeyStore {
    fn put(&self, record: &KeyRecord) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner.records.insert(record.key_id, record.clone());
        inner.latest = Some(record.key_id);

        debug_assert!(inner.records.contains_key(&record.key_id));
        Ok(())
    }

    fn get(&self, key_id: KeyId) -> Result<Option<KeyRecord>, StorageError> {
        Ok(self.lock()?.records.get(&key_id).cloned())
    }

    fn latest(&self) -> Result<Option<KeyRecord>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.latest.and_then(|key_id| inner.records.get(&key_id).cloned()))
    }

    fn all_key_ids(&self) -> Result<BTreeSet<KeyId>, StorageError> {
        Ok(self.lock()?.records.keys().copied().collect())
    }

    fn remove(&self, key_id: KeyId) -> Result<bool, StorageError> {
        let mut inner = self.lock()?;
        if inner.latest == Some(key_id) {
            return Err(StorageError::LatestKey);
        }
        Ok(inner.records.remove(&key_id).is_some())
    }

    fn device_id(&self) -> Result<Option<DeviceId>, StorageError> {
        Ok(self.lock()?.device_id)
    }

    fn set_device_id(&self, device_id: DeviceId) -> Result<(), StorageError> {
        self.lock()?.device_id = Some(device_id);
        Ok(())
    }

    fn rotation_lock(&self) -> RotationLock {
        Arc::clone(&self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use fanmail_crypto::KeyPair;

    use super::*;

    fn record(seed: u8, created_at_ms: u64) -> KeyRecord {
        KeyRecord {
            key_id: KeyId::from_random_bytes([seed; 16]),
            key_pair: KeyPair::from_seed([seed; 32]),
            created_at_ms,
        }
    }

    #[test]
    fn empty_store_has_no_latest() {
        let store = MemoryKeyStore::new();
        assert!(store.latest().unwrap().is_none());
        assert!(store.all_key_ids().unwrap().is_empty());
        assert!(store.device_id().unwrap().is_none());
    }

    #[test]
    fn put_moves_latest_pointer() {
        let store = MemoryKeyStore::new();
        let first = record(1, 100);
        let second = record(2, 50);

        store.put(&first).unwrap();
        store.put(&second).unwrap();

        // Latest follows the most recent put, not the newest timestamp
        assert_eq!(store.latest().unwrap().unwrap().key_id, second.key_id);
        assert!(store.get(first.key_id).unwrap().is_some());
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryKeyStore::new();
        let clone = store.clone();
        let r = record(3, 0);

        clone.put(&r).unwrap();
        assert_eq!(store.latest().unwrap().unwrap().key_id, r.key_id);
    }

    #[test]
    fn remove_refuses_latest() {
        let store = MemoryKeyStore::new();
        let old = record(1, 0);
        let new = record(2, 1);
        store.put(&old).unwrap();
        store.put(&new).unwrap();

        assert_eq!(store.remove(new.key_id), Err(StorageError::LatestKey));
        assert_eq!(store.remove(old.key_id), Ok(true));
        assert_eq!(store.remove(old.key_id), Ok(false));
        assert_eq!(store.all_key_ids().unwrap(), BTreeSet::from([new.key_id]));
    }

    #[test]
    fn device_id_persists() {
        let store = MemoryKeyStore::new();
        let device = DeviceId::from_random_bytes([9; 16]);
        store.set_device_id(device).unwrap();
        assert_eq!(store.device_id().unwrap(), Some(device));
    }

    #[test]
    fn poisoned_store_reports_errors_not_empty() {
        let store = MemoryKeyStore::new();
        store.put(&record(1, 0)).unwrap();

        let clone = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.inner.lock().unwrap();
            panic!("poison the key store");
        })
        .join();

        assert!(matches!(store.len(), Err(StorageError::Io(_))));
        assert!(matches!(store.is_empty(), Err(StorageError::Io(_))));
        assert!(matches!(store.latest(), Err(StorageError::Io(_))));
    }

    #[test]
    fn clones_share_rotation_lock() {
        let store = MemoryKeyStore::new();
        let clone = store.clone();
        let other = MemoryKeyStore::new();

        assert!(Arc::ptr_eq(&store.rotation_lock(), &clone.rotation_lock()));
        assert!(!Arc::ptr_eq(&store.rotation_lock(), &other.rotation_lock()));
    }
}
