//! Anonymous public key encryption ("sealed boxes").
//!
//! A sender who only knows a recipient's public key generates a throwaway
//! X25519 key pair, agrees on a shared secret with the recipient key, derives
//! a symmetric key via HKDF, and encrypts with XChaCha20-Poly1305. The
//! ephemeral public key travels with the ciphertext so the recipient can
//! repeat the agreement with its private key.

pub mod derivation;
pub mod encryption;
pub mod error;
pub mod keys;

pub use derivation::derive_seal_key;
pub use encryption::{EPHEMERAL_SEED_SIZE, NONCE_SIZE, SealedBox, open, seal};
pub use error::CryptoError;
pub use keys::{KEY_SIZE, KeyPair, PrivateKey, PublicKey};
