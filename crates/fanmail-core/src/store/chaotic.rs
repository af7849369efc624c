//! Chaotic key store wrapper for fault injection testing
//!
//! Wraps another key store and randomly fails operations, so tests can check
//! that storage failures surface as errors and never corrupt state.

use std::{
    collections::BTreeSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use fanmail_proto::{DeviceId, KeyId};

use super::{KeyRecord, KeyStore, RotationLock, StorageError};

/// Key store wrapper that randomly injects failures
///
/// Delegates to the inner store but fails each operation with probability
/// `failure_rate`. A failed operation never reaches the inner store. The
/// operation counter includes failed attempts.
#[derive(Clone)]
pub struct ChaoticKeyStore<S: KeyStore> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    operation_count: Arc<AtomicUsize>,
}

/// Linear congruential generator. Reproducible for a given seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // Numerical Recipes constants
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: KeyStore> ChaoticKeyStore<S> {
    /// Wrap `inner` with the default seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Wrap `inner` with an explicit seed for reproducible chaos.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    #[allow(clippy::panic)]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        if !(0.0..=1.0).contains(&failure_rate) {
            panic!("failure_rate must be between 0.0 and 1.0, got {failure_rate}");
        }

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Underlying store, for checking state after chaos.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total operations attempted, failed ones included.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::SeqCst)
    }

    /// Count the operation and decide whether it fails.
    fn roll(&self, operation: &str) -> Result<(), StorageError> {
        self.operation_count.fetch_add(1, Ordering::SeqCst);

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| StorageError::Io("chaotic rng mutex poisoned".to_string()))?;

        if rng.next() < self.failure_rate {
            return Err(StorageError::Io(format!("chaotic failure injection in {operation}")));
        }
        Ok(())
    }
}

impl<S: KeyStore> KeyStore for ChaoticKeyStore<S> {
    fn put(&self, record: &KeyRecord) -> Result<(), StorageError> {
        self.roll("put")?;
        self.inner.put(record)
    }

    fn get(&self, key_id: KeyId) -> Result<Option<KeyRecord>, StorageError> {
        self.roll("get")?;
        self.inner.get(key_id)
    }

    fn latest(&self) -> Result<Option<KeyRecord>, StorageError> {
        self.roll("latest")?;
        self.inner.latest()
    }

    fn all_key_ids(&self) -> Result<BTreeSet<KeyId>, StorageError> {
        self.roll("all_key_ids")?;
        self.inner.all_key_ids()
    }

    fn remove(&self, key_id: KeyId) -> Result<bool, StorageError> {
        self.roll("remove")?;
        self.inner.remove(key_id)
    }

    fn device_id(&self) -> Result<Option<DeviceId>, StorageError> {
        self.roll("device_id")?;
        self.inner.device_id()
    }

    fn set_device_id(&self, device_id: DeviceId) -> Result<(), StorageError> {
        self.roll("set_device_id")?;
        self.inner.set_device_id(device_id)
    }

    // Not a storage operation; never fails
    fn rotation_lock(&self) -> RotationLock {
        self.inner.rotation_lock()
    }
}

#[cfg(test)]
mod tests {
    use fanmail_crypto::KeyPair;

    use super::*;
    use crate::store::MemoryKeyStore;

    fn record(seed: u8) -> KeyRecord {
        KeyRecord {
            key_id: KeyId::from_random_bytes([seed; 16]),
            key_pair: KeyPair::from_seed([seed; 32]),
            created_at_ms: 0,
        }
    }

    #[test]
    fn zero_rate_never_fails_and_counts() {
        let store = ChaoticKeyStore::new(MemoryKeyStore::new(), 0.0);
        for seed in 0..20 {
            store.put(&record(seed)).unwrap();
        }
        store.latest().unwrap();

        assert_eq!(store.operation_count(), 21);
        assert_eq!(store.inner().len().unwrap(), 20);
    }

    #[test]
    fn full_rate_always_fails_without_touching_inner() {
        let store = ChaoticKeyStore::new(MemoryKeyStore::new(), 1.0);

        assert!(matches!(store.put(&record(1)), Err(StorageError::Io(_))));
        assert!(store.inner().is_empty().unwrap());
    }

    #[test]
    fn same_seed_same_failures() {
        let outcomes = |seed| {
            let store = ChaoticKeyStore::with_seed(MemoryKeyStore::new(), 0.5, seed);
            (0..32).map(|i| store.put(&record(i)).is_ok()).collect::<Vec<_>>()
        };

        assert_eq!(outcomes(7), outcomes(7));
    }

    #[test]
    fn failed_put_leaves_inner_consistent() {
        let store = ChaoticKeyStore::with_seed(MemoryKeyStore::new(), 0.5, 42);
        let mut last_ok = None;

        for seed in 0..64 {
            let r = record(seed);
            if store.put(&r).is_ok() {
                last_ok = Some(r.key_id);
            }
        }

        let latest = store.inner().latest().unwrap().map(|r| r.key_id);
        assert_eq!(latest, last_ok);
    }

    #[test]
    #[should_panic(expected = "failure_rate must be between")]
    fn rejects_out_of_range_rate() {
        let _ = ChaoticKeyStore::new(MemoryKeyStore::new(), 1.5);
    }
}
