//! Fanmail reference services.
//!
//! In-memory implementations of the two services the messaging core talks to,
//! and adapters that let a core component use them in-process.
//!
//! # Components
//!
//! - [`KeyDirectory`]: per-alias, per-device public keys; latest key per
//!   device wins
//! - [`MessageBoard`]: relays sealed bundles; fetch returns a conversation
//! - [`LocalDirectory`] / [`LocalTransport`]: bind a service to one
//!   authenticated alias and implement the core collaborator traits
//!
//! Neither service sees plaintext or private key material.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod key_directory;
mod local;
mod message_board;

pub use error::ServiceError;
pub use key_directory::KeyDirectory;
pub use local::{LocalDirectory, LocalTransport};
pub use message_board::MessageBoard;
