//! Fault-injecting collaborator wrappers.
//!
//! Wrap a directory or transport and fail chosen operations on demand. Faults
//! are switched at runtime through shared flags, so a test can take a service
//! down between two calls on the same handle. Failed calls never reach the
//! inner service.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use fanmail_core::{DirectoryClient, DirectoryError, MessageTransport, TransportError};
use fanmail_crypto::PublicKey;
use fanmail_proto::{Alias, DeviceId, DirectoryEntry, KeyId, MessageBundle, SubmitRequest};

/// Switch and call counter for one operation.
#[derive(Clone, Default)]
pub struct Fault {
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl Fault {
    /// Make subsequent calls fail (`true`) or pass through (`false`).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Calls attempted so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Count the call; `true` if it must fail.
    fn trip(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.failing.load(Ordering::SeqCst)
    }
}

/// [`DirectoryClient`] wrapper with switchable failures.
///
/// `register` yields to the scheduler before delegating so concurrent
/// rotations interleave on a single-threaded runtime.
#[derive(Clone)]
pub struct FaultyDirectory<D> {
    inner: D,
    /// Fault for `register`
    pub register: Fault,
    /// Fault for `lookup`
    pub lookup: Fault,
}

impl<D: DirectoryClient> FaultyDirectory<D> {
    /// Wrap `inner` with every fault off.
    pub fn new(inner: D) -> Self {
        Self { inner, register: Fault::default(), lookup: Fault::default() }
    }

    /// Wrapped directory.
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: DirectoryClient> DirectoryClient for FaultyDirectory<D> {
    async fn register(
        &self,
        device_id: DeviceId,
        key_id: KeyId,
        public_key: &PublicKey,
    ) -> Result<(), DirectoryError> {
        tokio::task::yield_now().await;
        if self.register.trip() {
            return Err(DirectoryError::Unavailable("injected register failure".to_string()));
        }
        self.inner.register(device_id, key_id, public_key).await
    }

    async fn lookup(&self, subject: &Alias) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        if self.lookup.trip() {
            return Err(DirectoryError::Unavailable("injected lookup failure".to_string()));
        }
        self.inner.lookup(subject).await
    }
}

/// [`MessageTransport`] wrapper with switchable failures.
#[derive(Clone)]
pub struct FaultyTransport<T> {
    inner: T,
    /// Fault for `submit`
    pub submit: Fault,
    /// Fault for `fetch`
    pub fetch: Fault,
}

impl<T: MessageTransport> FaultyTransport<T> {
    /// Wrap `inner` with every fault off.
    pub fn new(inner: T) -> Self {
        Self { inner, submit: Fault::default(), fetch: Fault::default() }
    }

    /// Wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: MessageTransport> MessageTransport for FaultyTransport<T> {
    async fn submit(&self, request: SubmitRequest) -> Result<(), TransportError> {
        if self.submit.trip() {
            return Err(TransportError::Unavailable("injected submit failure".to_string()));
        }
        self.inner.submit(request).await
    }

    async fn fetch(&self, subject: &Alias) -> Result<Vec<MessageBundle>, TransportError> {
        if self.fetch.trip() {
            return Err(TransportError::Unavailable("injected fetch failure".to_string()));
        }
        self.inner.fetch(subject).await
    }
}
