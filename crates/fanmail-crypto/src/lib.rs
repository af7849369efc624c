//! Fanmail Cryptographic Primitives
//!
//! Public key encryption for Fanmail. Every message is sealed independently
//! to each recipient device key, so a device only ever needs its own private
//! key to read what was addressed to it. Pure functions with deterministic
//! outputs: callers provide random bytes for deterministic testing.
//!
//! # Sealed Box
//!
//! ```text
//! Recipient Public Key ─┐
//!                       ▼
//! Ephemeral Secret → X25519 ECDH → Shared Secret
//!                                      │
//!                                      ▼
//!                    HKDF-SHA256 (ephemeral ‖ recipient) → Seal Key
//!                                      │
//!                                      ▼
//!                    XChaCha20-Poly1305 → ephemeral ‖ nonce ‖ ciphertext
//! ```
//!
//! The ephemeral secret is used for exactly one box and discarded. Only the
//! holder of the recipient private key can recompute the shared secret.
//!
//! # Security
//!
//! - X25519 gives roughly 128-bit security per recipient key
//! - Low-order recipient keys are rejected before any ciphertext is produced
//! - The seal key is bound to both public keys, so a box cannot be replayed
//!   under a different recipient
//! - Private key bytes are zeroized on drop

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod sealed_box;

pub use sealed_box::{
    CryptoError, EPHEMERAL_SEED_SIZE, KEY_SIZE, KeyPair, NONCE_SIZE, PrivateKey, PublicKey,
    SealedBox, open, seal,
};
