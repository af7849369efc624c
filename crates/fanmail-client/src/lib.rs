//! Fanmail client.
//!
//! Production wiring for the messaging core: a system [`Environment`]
//! (`SystemEnv`), a durable redb key store, and a [`Session`] that sequences
//! key lifecycle, fan-out and resolution for one device.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use fanmail_client::{RedbKeyStore, Session, SessionConfig, SystemEnv};
//! use fanmail_proto::Alias;
//! use fanmail_server::{KeyDirectory, LocalDirectory, LocalTransport, MessageBoard};
//!
//! let alias = Alias::new("alice")?;
//! let directory = LocalDirectory::new(KeyDirectory::new(), alias.clone());
//! let transport = LocalTransport::new(MessageBoard::new(), alias.clone());
//! let store = RedbKeyStore::open("alice.redb")?;
//!
//! let config = SessionConfig::default();
//! let session =
//!     Session::start(SystemEnv::new(), store, directory, transport, alias, config).await?;
//! let sent = session.send(&Alias::new("bob")?, "hello").await;
//! # let _ = sent;
//! # Ok(())
//! # }
//! ```
//!
//! [`Environment`]: fanmail_core::Environment

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod session;
pub mod storage;
pub mod system_env;

pub use config::SessionConfig;
pub use session::{DeliveryStatus, Outgoing, Session, SessionError};
pub use storage::RedbKeyStore;
pub use system_env::SystemEnv;
