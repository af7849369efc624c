//! Client session facade.
//!
//! A [`Session`] owns one device's lifecycle manager, fan-out and resolver and
//! sequences them: the key is made fresh during [`Session::start`], so every
//! later send has a local key to seal the self entry with.

use fanmail_core::{
    DecryptionResolver, DeviceIdentity, DirectoryClient, EncryptionFanout, Environment,
    KeyLifecycleManager, KeyStatus, KeyStore, LifecycleError, MessageTransport, ReceivedMessage,
    ResolveError, SendError, StorageError,
};
use fanmail_proto::Alias;
use thiserror::Error;

use crate::config::SessionConfig;

/// Errors from starting or refreshing a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Device identity could not be loaded or created
    #[error("device identity unavailable: {0}")]
    Identity(#[from] StorageError),

    /// Key rotation or pruning failed
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Outcome of one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Bundle was accepted by the transport
    Delivered,
    /// Nothing was submitted
    Failed(SendError),
}

/// A message this session tried to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    /// Intended recipient
    pub recipient: Alias,
    /// Plaintext as typed
    pub text: String,
    /// Whether the send went through
    pub status: DeliveryStatus,
}

impl Outgoing {
    /// Whether the transport accepted the message.
    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }
}

/// One signed-in device.
pub struct Session<E, S, D, T> {
    alias: Alias,
    config: SessionConfig,
    lifecycle: KeyLifecycleManager<E, S, D>,
    fanout: EncryptionFanout<E, S, D, T>,
    resolver: DecryptionResolver<S, T>,
}

impl<E, S, D, T> Session<E, S, D, T>
where
    E: Environment,
    S: KeyStore,
    D: DirectoryClient + Clone,
    T: MessageTransport + Clone,
{
    /// Load or create the device identity, make sure a fresh key is
    /// registered, and apply the retention policy.
    pub async fn start(
        env: E,
        store: S,
        directory: D,
        transport: T,
        alias: Alias,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let device = DeviceIdentity::load_or_create(&env, &store)?;

        let session = Self {
            lifecycle: KeyLifecycleManager::new(
                env.clone(),
                store.clone(),
                directory.clone(),
                device,
            ),
            fanout: EncryptionFanout::new(
                env,
                store.clone(),
                directory,
                transport.clone(),
                alias.clone(),
                config.fanout,
            ),
            resolver: DecryptionResolver::new(store, transport),
            alias,
            config,
        };

        let status = session.refresh().await?;
        tracing::info!(
            alias = %session.alias,
            device_id = %device.device_id(),
            key_id = %status.current(),
            "session started"
        );

        Ok(session)
    }

    /// Alias this session sends as.
    pub fn alias(&self) -> &Alias {
        &self.alias
    }

    /// Device this session runs on.
    pub fn device(&self) -> DeviceIdentity {
        self.lifecycle.device()
    }

    /// Re-run the key freshness check, then prune retired keys if a retention
    /// period is configured. Call periodically for long-lived sessions.
    pub async fn refresh(&self) -> Result<KeyStatus, LifecycleError> {
        let status = self.lifecycle.ensure_fresh_key(self.config.lifecycle.max_age).await?;

        if let Some(retention) = self.config.lifecycle.retention {
            self.lifecycle.prune(retention).await?;
        }

        Ok(status)
    }

    /// Send `text` to `recipient`. Failures are reported in the returned
    /// status rather than as an error, so the caller can show them inline.
    pub async fn send(&self, recipient: &Alias, text: &str) -> Outgoing {
        let status = match self.fanout.send(text, recipient).await {
            Ok(bundle) => {
                tracing::debug!(%recipient, entries = bundle.ciphers.len(), "message delivered");
                DeliveryStatus::Delivered
            },
            Err(err) => {
                tracing::warn!(%recipient, error = %err, "message not sent");
                DeliveryStatus::Failed(err)
            },
        };

        Outgoing { recipient: recipient.clone(), text: text.to_string(), status }
    }

    /// Conversation with `subject`, newest first, each message resolved to
    /// plaintext or the unreadable placeholder.
    pub async fn conversation(
        &self,
        subject: &Alias,
    ) -> Result<Vec<ReceivedMessage>, ResolveError> {
        self.resolver.fetch_conversation(subject).await
    }
}
