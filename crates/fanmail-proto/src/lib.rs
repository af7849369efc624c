//! Fanmail wire types.
//!
//! Request and response shapes exchanged with the two external services, plus
//! the identifiers they carry:
//!
//! - Key directory: [`RegisterKeyRequest`], [`LookupRequest`],
//!   [`LookupResponse`]
//! - Message transport: [`SubmitRequest`], [`FetchRequest`], [`FetchResponse`]
//!
//! Messages are CBOR-encoded with [`encode`] and [`decode`]. Ciphertexts travel
//! as base64 text inside [`CipherEntry`] so the transport can store them as
//! opaque strings.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod directory;
pub mod errors;
pub mod ids;
pub mod transport;

pub use codec::{decode, encode};
pub use directory::{DirectoryEntry, LookupRequest, LookupResponse, RegisterKeyRequest};
pub use errors::{ProtocolError, Result};
pub use ids::{Alias, DeviceId, KeyId};
pub use transport::{CipherEntry, FetchRequest, FetchResponse, MessageBundle, SubmitRequest};
