//! Durable key storage.
//!
//! The `KeyStore` trait and its in-memory implementations live in
//! `fanmail-core`; this module adds the on-disk implementation the client
//! binary runs with.

mod redb;

pub use self::redb::RedbKeyStore;
