//! Fanmail messaging core.
//!
//! End-to-end encrypted multi-device messaging between aliases. The relaying
//! services only ever see public keys and sealed ciphertexts.
//!
//! # Architecture
//!
//! Every component receives its environment, key store and collaborator
//! handles explicitly; there is no ambient state. The two external services
//! sit behind traits so production adapters, in-process reference services
//! and fault-injecting test doubles are interchangeable.
//!
//! # Components
//!
//! - [`KeyStore`]: durable local key records with a single latest pointer
//! - [`KeyLifecycleManager`]: freshness check and single-flight rotation
//! - [`DirectoryClient`]: boundary to the key directory
//! - [`MessageTransport`]: boundary to the message transport
//! - [`EncryptionFanout`]: seals one message to every target key
//! - [`DecryptionResolver`]: opens a bundle with whichever local key fits
//!
//! # Flow
//!
//! ```text
//! session start:  KeyStore ─▶ stale? ─▶ generate ─▶ register ─▶ put
//! send:           lookup(recipient) + latest() ─▶ seal × n ─▶ submit
//! receive:        fetch(subject) ─▶ for each entry: held? ─▶ open ─▶ first wins
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod device;
pub mod directory;
pub mod env;
pub mod error;
pub mod fanout;
pub mod lifecycle;
pub mod resolver;
pub mod store;
pub mod transport;

pub use device::DeviceIdentity;
pub use directory::DirectoryClient;
pub use env::Environment;
pub use error::{DirectoryError, LifecycleError, ResolveError, SendError, TransportError};
pub use fanout::{EncryptionFanout, FanoutConfig};
pub use lifecycle::{DEFAULT_MAX_AGE, KeyLifecycleManager, KeyStatus, LifecycleConfig};
pub use resolver::{DecryptionResolver, ReceivedMessage, Resolution, UNREADABLE_PLACEHOLDER};
pub use store::{
    ChaoticKeyStore, KeyRecord, KeyStore, MemoryKeyStore, RotationLock, StorageError,
};
pub use transport::MessageTransport;
