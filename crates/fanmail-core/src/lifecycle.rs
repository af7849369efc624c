//! Key lifecycle: freshness checks, rotation and retention.
//!
//! Per device the derived state moves `NO_KEY -> FRESH -> STALE -> FRESH`.
//! Rotation generates a key pair, registers its public half with the key
//! directory, and only then persists it, so a failed registration leaves the
//! store exactly as it was.
//!
//! Rotation is single-flight per key store: the async mutex comes from
//! [`KeyStore::rotation_lock`], so every manager over the same store (clones
//! and independently built ones alike) shares it, and the staleness check is
//! repeated once the mutex is held. Concurrent callers therefore serialize
//! and at most one of them rotates.

use std::time::Duration;

use fanmail_crypto::KeyPair;
use fanmail_proto::KeyId;

use crate::{
    device::DeviceIdentity,
    directory::DirectoryClient,
    env::Environment,
    error::LifecycleError,
    store::{KeyRecord, KeyStore},
};

/// Default maximum key age (7 days).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Key lifecycle configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Age at which the latest key is stale and gets rotated
    pub max_age: Duration,
    /// Age at which retired keys are pruned. `None` keeps every key, so old
    /// messages stay readable.
    pub retention: Option<Duration>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self { max_age: DEFAULT_MAX_AGE, retention: None }
    }
}

/// Outcome of [`KeyLifecycleManager::ensure_fresh_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// Latest key was below the maximum age; nothing changed
    Fresh {
        /// Current latest key
        key_id: KeyId,
    },
    /// A new key was generated, registered and persisted
    Rotated {
        /// Key that was latest before, if any
        previous: Option<KeyId>,
        /// New latest key
        current: KeyId,
    },
}

impl KeyStatus {
    /// Latest key after the call.
    pub fn current(&self) -> KeyId {
        match self {
            Self::Fresh { key_id } => *key_id,
            Self::Rotated { current, .. } => *current,
        }
    }
}

/// Drives key rotation for one device.
///
/// Failures are returned to the caller and never retried internally.
#[derive(Clone)]
pub struct KeyLifecycleManager<E, S, D> {
    env: E,
    store: S,
    directory: D,
    device: DeviceIdentity,
}

impl<E, S, D> KeyLifecycleManager<E, S, D>
where
    E: Environment,
    S: KeyStore,
    D: DirectoryClient,
{
    /// Create a manager. Rotation is serialized with every other manager
    /// over the same store.
    pub fn new(env: E, store: S, directory: D, device: DeviceIdentity) -> Self {
        Self { env, store, directory, device }
    }

    /// Device this manager rotates keys for.
    pub fn device(&self) -> DeviceIdentity {
        self.device
    }

    /// Make sure the latest key is younger than `max_age`, rotating if not.
    ///
    /// # Invariants
    ///
    /// - Post (Ok): `store.latest()` exists and is younger than `max_age`
    /// - Post (Err `RotationFailed`): store unchanged, new key discarded
    /// - Concurrent calls on managers sharing a store rotate at most once
    pub async fn ensure_fresh_key(&self, max_age: Duration) -> Result<KeyStatus, LifecycleError> {
        let max_age_ms = duration_ms(max_age);

        if let Some(key_id) = self.fresh_key_id(max_age_ms)? {
            tracing::debug!(%key_id, "latest key is fresh");
            return Ok(KeyStatus::Fresh { key_id });
        }

        let rotation = self.store.rotation_lock();
        let _guard = rotation.lock().await;

        // Another caller may have rotated while we waited
        if let Some(key_id) = self.fresh_key_id(max_age_ms)? {
            tracing::debug!(%key_id, "key rotated by concurrent caller");
            return Ok(KeyStatus::Fresh { key_id });
        }

        let previous = self.store.latest()?.map(|record| record.key_id);
        let current = self.rotate().await?;

        tracing::info!(
            device_id = %self.device.device_id(),
            previous = ?previous,
            %current,
            "rotated device key"
        );

        Ok(KeyStatus::Rotated { previous, current })
    }

    /// Remove retired keys at least `retention` old. The latest key is never
    /// removed.
    ///
    /// Returns the removed key ids in ascending order.
    pub async fn prune(&self, retention: Duration) -> Result<Vec<KeyId>, LifecycleError> {
        let retention_ms = duration_ms(retention);
        let rotation = self.store.rotation_lock();
        let _guard = rotation.lock().await;

        let now = self.env.wall_clock_ms();
        let latest = self.store.latest()?.map(|record| record.key_id);
        let mut removed = Vec::new();

        for key_id in self.store.all_key_ids()? {
            if Some(key_id) == latest {
                continue;
            }
            let Some(record) = self.store.get(key_id)? else {
                continue;
            };
            if record.age_ms(now) >= retention_ms && self.store.remove(key_id)? {
                removed.push(key_id);
            }
        }

        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "pruned retired keys");
        }

        Ok(removed)
    }

    /// Latest key id if one exists and is younger than `max_age_ms`.
    fn fresh_key_id(&self, max_age_ms: u64) -> Result<Option<KeyId>, LifecycleError> {
        let now = self.env.wall_clock_ms();
        Ok(self
            .store
            .latest()?
            .filter(|record| record.age_ms(now) < max_age_ms)
            .map(|record| record.key_id))
    }

    /// Generate, register, then persist. Caller holds the rotation lock.
    async fn rotate(&self) -> Result<KeyId, LifecycleError> {
        let record = KeyRecord {
            key_id: KeyId::from_random_bytes(self.env.random_array()),
            key_pair: KeyPair::from_seed(self.env.random_array()),
            created_at_ms: self.env.wall_clock_ms(),
        };

        if let Err(err) = self
            .directory
            .register(self.device.device_id(), record.key_id, record.public_key())
            .await
        {
            tracing::warn!(key_id = %record.key_id, error = %err, "key registration failed");
            return Err(LifecycleError::RotationFailed(err));
        }

        if let Err(err) = self.store.put(&record) {
            // Directory now lists a key this device does not hold; the next
            // rotation supersedes it.
            tracing::warn!(key_id = %record.key_id, error = %err, "persisting registered key failed");
            return Err(err.into());
        }

        Ok(record.key_id)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
