//! Device identity.

use fanmail_proto::DeviceId;

use crate::{
    env::Environment,
    store::{KeyStore, StorageError},
};

/// Identity of this installation.
///
/// Attached to directory registrations as metadata. Never used as
/// cryptographic material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    device_id: DeviceId,
}

impl DeviceIdentity {
    /// Load the persisted identity, creating and persisting one on first use.
    ///
    /// Stable across calls for the same store.
    pub fn load_or_create<E: Environment, S: KeyStore>(
        env: &E,
        store: &S,
    ) -> Result<Self, StorageError> {
        if let Some(device_id) = store.device_id()? {
            return Ok(Self { device_id });
        }

        let device_id = DeviceId::from_random_bytes(env.random_array());
        store.set_device_id(device_id)?;
        tracing::info!(%device_id, "created device identity");

        Ok(Self { device_id })
    }

    /// Wrap a known identifier.
    pub fn from_device_id(device_id: DeviceId) -> Self {
        Self { device_id }
    }

    /// The device identifier.
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    };

    use super::*;
    use crate::store::{ChaoticKeyStore, MemoryKeyStore};

    /// Counter-based environment; every random byte is the next counter value.
    #[derive(Clone, Default)]
    struct CountingEnv(Arc<AtomicU8>);

    impl Environment for CountingEnv {
        fn wall_clock_ms(&self) -> u64 {
            0
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            for byte in buffer {
                *byte = self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn created_once_then_loaded() {
        let env = CountingEnv::default();
        let store = MemoryKeyStore::new();

        let first = DeviceIdentity::load_or_create(&env, &store).unwrap();
        let second = DeviceIdentity::load_or_create(&env, &store).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.device_id().unwrap(), Some(first.device_id()));
    }

    #[test]
    fn storage_failure_surfaces() {
        let env = CountingEnv::default();
        let store = ChaoticKeyStore::new(MemoryKeyStore::new(), 1.0);

        assert!(DeviceIdentity::load_or_create(&env, &store).is_err());
        assert!(store.inner().device_id().unwrap().is_none());
    }
}
