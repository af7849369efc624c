//! Simulated world: shared services plus any number of devices.
//!
//! A [`World`] owns one key directory, one message board and one clock. Each
//! [`SimDevice`] is an installation with its own key store and RNG stream,
//! talking to the shared services through fault-injecting adapters.

use fanmail_core::{
    DecryptionResolver, DeviceIdentity, EncryptionFanout, FanoutConfig, KeyLifecycleManager,
    KeyStore, MemoryKeyStore, StorageError,
};
use fanmail_proto::Alias;
use fanmail_server::{KeyDirectory, LocalDirectory, LocalTransport, MessageBoard};

use crate::{
    faulty::{FaultyDirectory, FaultyTransport},
    sim_env::SimEnv,
};

/// Directory handle used by simulated devices.
pub type SimDirectory = FaultyDirectory<LocalDirectory>;

/// Transport handle used by simulated devices.
pub type SimTransport = FaultyTransport<LocalTransport>;

/// Shared services and clock.
pub struct World {
    env: SimEnv,
    directory: KeyDirectory,
    board: MessageBoard,
    next_stream: u64,
}

impl World {
    /// Empty world with a seeded root environment.
    pub fn new(seed: u64) -> Self {
        Self {
            env: SimEnv::with_seed(seed),
            directory: KeyDirectory::new(),
            board: MessageBoard::new(),
            next_stream: 0,
        }
    }

    /// Root environment. Advancing it advances every device's clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Shared key directory.
    pub fn directory(&self) -> &KeyDirectory {
        &self.directory
    }

    /// Shared message board.
    pub fn board(&self) -> &MessageBoard {
        &self.board
    }

    /// New installation for `alias` with an in-memory key store.
    pub fn device(&mut self, alias: &str) -> Result<SimDevice<MemoryKeyStore>, StorageError> {
        self.device_with_store(alias, MemoryKeyStore::new())
    }

    /// New installation for `alias` backed by `store`.
    ///
    /// # Panics
    ///
    /// Panics if `alias` is empty.
    #[allow(clippy::expect_used)]
    pub fn device_with_store<S: KeyStore>(
        &mut self,
        alias: &str,
        store: S,
    ) -> Result<SimDevice<S>, StorageError> {
        let alias = Alias::new(alias).expect("simulated alias must not be empty");
        let env = self.env.fork(self.next_stream);
        self.next_stream += 1;

        let identity = DeviceIdentity::load_or_create(&env, &store)?;
        tracing::debug!(%alias, device_id = %identity.device_id(), "added simulated device");

        Ok(SimDevice {
            directory: FaultyDirectory::new(LocalDirectory::new(
                self.directory.clone(),
                alias.clone(),
            )),
            transport: FaultyTransport::new(LocalTransport::new(self.board.clone(), alias.clone())),
            alias,
            env,
            store,
            identity,
        })
    }
}

/// One simulated installation.
#[derive(Clone)]
pub struct SimDevice<S> {
    /// Authenticated alias
    pub alias: Alias,
    /// Device environment (shared clock, own RNG stream)
    pub env: SimEnv,
    /// Local key store
    pub store: S,
    /// Persisted device identity
    pub identity: DeviceIdentity,
    /// Directory handle; faults are switchable
    pub directory: SimDirectory,
    /// Transport handle; faults are switchable
    pub transport: SimTransport,
}

impl<S: KeyStore> SimDevice<S> {
    /// Lifecycle manager for this device. Every manager shares the store's
    /// rotation lock, so separate calls still rotate one at a time.
    pub fn lifecycle(&self) -> KeyLifecycleManager<SimEnv, S, SimDirectory> {
        KeyLifecycleManager::new(
            self.env.clone(),
            self.store.clone(),
            self.directory.clone(),
            self.identity,
        )
    }

    /// Fan-out sending as this device's alias.
    pub fn fanout(
        &self,
        config: FanoutConfig,
    ) -> EncryptionFanout<SimEnv, S, SimDirectory, SimTransport> {
        EncryptionFanout::new(
            self.env.clone(),
            self.store.clone(),
            self.directory.clone(),
            self.transport.clone(),
            self.alias.clone(),
            config,
        )
    }

    /// Resolver reading this device's keys.
    pub fn resolver(&self) -> DecryptionResolver<S, SimTransport> {
        DecryptionResolver::new(self.store.clone(), self.transport.clone())
    }
}
