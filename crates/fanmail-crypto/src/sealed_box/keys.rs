//! X25519 device key pairs.
//!
//! Keys are built from caller-supplied seed bytes so the same seed always
//! yields the same pair. Export and import are plain 32-byte arrays; the
//! round trip is exact, which is the only format requirement for keys kept
//! in local storage.

use x25519_dalek::StaticSecret;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::CryptoError;

/// Size of X25519 public and private keys in bytes.
pub const KEY_SIZE: usize = 32;

/// Public half of a device key. Safe to publish.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; KEY_SIZE]);

impl PublicKey {
    /// Import a public key from its exported bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: bytes.len() })?;
        Ok(Self(array))
    }

    /// Exported key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Exported key bytes, by value.
    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({:02x}{:02x}{:02x}{:02x}..)", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

/// Private half of a device key.
///
/// Never leaves the device. Bytes are zeroized when dropped and `Debug`
/// output is redacted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; KEY_SIZE]);

impl PrivateKey {
    /// Import a private key from its exported bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: bytes.len() })?;
        Ok(Self(array))
    }

    /// Exported key bytes. Only for writing to local key storage.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        let secret = StaticSecret::from(self.0);
        PublicKey(x25519_dalek::PublicKey::from(&secret).to_bytes())
    }

    pub(crate) fn secret(&self) -> StaticSecret {
        StaticSecret::from(self.0)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// A device key pair.
#[derive(Clone, Debug)]
pub struct KeyPair {
    public: PublicKey,
    private: PrivateKey,
}

impl KeyPair {
    /// Build a key pair from 32 seed bytes.
    ///
    /// # Security
    ///
    /// Caller MUST provide cryptographically secure random bytes in
    /// production. X25519 clamping is applied during scalar multiplication,
    /// so every seed is a valid private key.
    pub fn from_seed(seed: [u8; KEY_SIZE]) -> Self {
        let private = PrivateKey(seed);
        let public = private.public_key();
        Self { public, private }
    }

    /// Reassemble a pair from stored halves.
    pub fn from_parts(public: PublicKey, private: PrivateKey) -> Self {
        Self { public, private }
    }

    /// Public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Private half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_pair() {
        let a = KeyPair::from_seed([7; KEY_SIZE]);
        let b = KeyPair::from_seed([7; KEY_SIZE]);
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn different_seeds_different_public_keys() {
        let a = KeyPair::from_seed([1; KEY_SIZE]);
        let b = KeyPair::from_seed([2; KEY_SIZE]);
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn export_import_is_exact() {
        let pair = KeyPair::from_seed([42; KEY_SIZE]);

        let public = PublicKey::from_bytes(pair.public_key().as_bytes()).unwrap();
        let private = PrivateKey::from_bytes(pair.private_key().as_bytes()).unwrap();

        assert_eq!(&public, pair.public_key());
        assert_eq!(private.as_bytes(), pair.private_key().as_bytes());
        assert_eq!(private.public_key(), public);
    }

    #[test]
    fn wrong_length_rejected() {
        let result = PublicKey::from_bytes(&[0u8; 31]);
        assert_eq!(result, Err(CryptoError::InvalidKeyLength { expected: 32, actual: 31 }));

        assert!(PrivateKey::from_bytes(&[0u8; 33]).is_err());
    }

    #[test]
    fn private_key_debug_is_redacted() {
        let pair = KeyPair::from_seed([9; KEY_SIZE]);
        let rendered = format!("{:?}", pair.private_key());
        assert_eq!(rendered, "PrivateKey(<redacted>)");
    }
}
