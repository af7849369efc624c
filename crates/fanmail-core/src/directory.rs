//! Key directory boundary.
//!
//! The directory is an external service; the core only depends on this trait.
//! Production adapters speak the wire contract in `fanmail-proto`, tests plug
//! in in-process or fault-injecting implementations.

use std::sync::Arc;

use async_trait::async_trait;
use fanmail_crypto::PublicKey;
use fanmail_proto::{Alias, DeviceId, DirectoryEntry, KeyId};

use crate::error::DirectoryError;

/// Client of the key directory, acting as one authenticated alias.
#[async_trait]
pub trait DirectoryClient: Send + Sync + 'static {
    /// Publish a new public key for one of this alias' devices.
    ///
    /// Registering the same `(device_id, key_id)` twice is harmless.
    async fn register(
        &self,
        device_id: DeviceId,
        key_id: KeyId,
        public_key: &PublicKey,
    ) -> Result<(), DirectoryError>;

    /// Keys currently published by `subject`, in directory order.
    ///
    /// Possibly empty. Authoritative for who can receive at the instant of the
    /// call.
    async fn lookup(&self, subject: &Alias) -> Result<Vec<DirectoryEntry>, DirectoryError>;
}

#[async_trait]
impl<T: DirectoryClient + ?Sized> DirectoryClient for Arc<T> {
    async fn register(
        &self,
        device_id: DeviceId,
        key_id: KeyId,
        public_key: &PublicKey,
    ) -> Result<(), DirectoryError> {
        (**self).register(device_id, key_id, public_key).await
    }

    async fn lookup(&self, subject: &Alias) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        (**self).lookup(subject).await
    }
}
