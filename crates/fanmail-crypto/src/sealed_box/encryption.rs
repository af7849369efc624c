//! Sealing and opening with X25519 + `XChaCha20-Poly1305`
//!
//! All functions are pure - random bytes must be provided by the caller.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use x25519_dalek::StaticSecret;
use zeroize::Zeroize;

use super::{
    derivation::derive_seal_key,
    error::CryptoError,
    keys::{KEY_SIZE, PrivateKey, PublicKey},
};

/// Size of the `XChaCha20` nonce (24 bytes)
pub const NONCE_SIZE: usize = 24;

/// Size of the seed for the one-time ephemeral key (32 bytes)
pub const EPHEMERAL_SEED_SIZE: usize = 32;

/// Poly1305 tag size (16 bytes)
const POLY1305_TAG_SIZE: usize = 16;

/// Fixed prefix of an encoded box: ephemeral public key and nonce.
const HEADER_SIZE: usize = KEY_SIZE + NONCE_SIZE;

/// One plaintext encrypted to one public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBox {
    /// One-time public key the recipient combines with its private key
    pub ephemeral_public: [u8; KEY_SIZE],
    /// The 24-byte `XChaCha20` nonce
    pub nonce: [u8; NONCE_SIZE],
    /// The ciphertext including 16-byte Poly1305 tag
    pub ciphertext: Vec<u8>,
}

impl SealedBox {
    /// Plaintext length (ciphertext length minus authentication tag).
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(POLY1305_TAG_SIZE)
    }

    /// Encode as `ephemeral_public ‖ nonce ‖ ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(&self.ephemeral_public);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Decode from `ephemeral_public ‖ nonce ‖ ciphertext`.
    ///
    /// # Errors
    ///
    /// - `Malformed`: input shorter than header plus tag
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let min = HEADER_SIZE + POLY1305_TAG_SIZE;
        if bytes.len() < min {
            return Err(CryptoError::Malformed { len: bytes.len(), min });
        }

        let mut ephemeral_public = [0u8; KEY_SIZE];
        ephemeral_public.copy_from_slice(&bytes[..KEY_SIZE]);

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[KEY_SIZE..HEADER_SIZE]);

        Ok(Self { ephemeral_public, nonce, ciphertext: bytes[HEADER_SIZE..].to_vec() })
    }
}

/// Seal a plaintext to a recipient public key.
///
/// # Security
///
/// - `ephemeral_seed` MUST be fresh cryptographically secure randomness for
///   every call; reusing it across boxes to the same recipient reuses the
///   seal key
/// - `nonce` MUST be random; together with a fresh ephemeral key a collision
///   is negligible
///
/// # Errors
///
/// - `NonContributory`: recipient key is a low-order point
/// - `EncryptionFailed`: AEAD rejected the plaintext
pub fn seal(
    recipient: &PublicKey,
    plaintext: &[u8],
    ephemeral_seed: [u8; EPHEMERAL_SEED_SIZE],
    nonce: [u8; NONCE_SIZE],
) -> Result<SealedBox, CryptoError> {
    let ephemeral = StaticSecret::from(ephemeral_seed);
    let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral).to_bytes();

    let shared = ephemeral.diffie_hellman(&x25519_dalek::PublicKey::from(recipient.to_bytes()));
    if !shared.was_contributory() {
        return Err(CryptoError::NonContributory);
    }

    let mut key = derive_seal_key(shared.as_bytes(), &ephemeral_public, recipient.as_bytes());
    let cipher = XChaCha20Poly1305::new((&key).into());
    key.zeroize();

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(SealedBox { ephemeral_public, nonce, ciphertext })
}

/// Open a sealed box with the recipient private key.
///
/// Returns the decrypted plaintext.
///
/// # Errors
///
/// - `DecryptionFailed`: wrong key, tampered box, or degenerate ephemeral key
pub fn open(private: &PrivateKey, sealed: &SealedBox) -> Result<Vec<u8>, CryptoError> {
    let recipient_public = private.public_key();
    let shared =
        private.secret().diffie_hellman(&x25519_dalek::PublicKey::from(sealed.ephemeral_public));
    if !shared.was_contributory() {
        return Err(CryptoError::DecryptionFailed {
            reason: "ephemeral key is a low-order point".to_string(),
        });
    }

    let mut key =
        derive_seal_key(shared.as_bytes(), &sealed.ephemeral_public, recipient_public.as_bytes());
    let cipher = XChaCha20Poly1305::new((&key).into());
    key.zeroize();

    cipher.decrypt(XNonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice()).map_err(|_| {
        CryptoError::DecryptionFailed { reason: "authentication failed".to_string() }
    })
}

#[cfg(test)]
mod tests {
    use super::{super::keys::KeyPair, *};

    fn recipient() -> KeyPair {
        let mut seed = [0u8; 32];
        for (i, byte) in seed.iter_mut().enumerate() {
            *byte = i as u8;
        }
        KeyPair::from_seed(seed)
    }

    #[test]
    fn seal_open_roundtrip() {
        let pair = recipient();
        let sealed = seal(pair.public_key(), b"Hello, World!", [0xAB; 32], [0xCD; 24]).unwrap();
        let opened = open(pair.private_key(), &sealed).unwrap();

        assert_eq!(opened, b"Hello, World!");
    }

    #[test]
    fn seal_open_empty_message() {
        let pair = recipient();
        let sealed = seal(pair.public_key(), b"", [1; 32], [2; 24]).unwrap();

        assert_eq!(sealed.plaintext_len(), 0);
        assert_eq!(open(pair.private_key(), &sealed).unwrap(), b"");
    }

    #[test]
    fn wrong_private_key_fails() {
        let pair = recipient();
        let other = KeyPair::from_seed([0x55; 32]);
        let sealed = seal(pair.public_key(), b"secret", [3; 32], [4; 24]).unwrap();

        let result = open(other.private_key(), &sealed);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed { .. })));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let pair = recipient();
        let mut sealed = seal(pair.public_key(), b"secret", [3; 32], [4; 24]).unwrap();
        sealed.ciphertext[0] ^= 0x01;

        assert!(open(pair.private_key(), &sealed).is_err());
    }

    #[test]
    fn tampered_ephemeral_key_fails() {
        let pair = recipient();
        let mut sealed = seal(pair.public_key(), b"secret", [3; 32], [4; 24]).unwrap();
        sealed.ephemeral_public[5] ^= 0x80;

        assert!(open(pair.private_key(), &sealed).is_err());
    }

    #[test]
    fn low_order_recipient_rejected() {
        let zero_point = PublicKey::from_bytes(&[0u8; 32]).unwrap();
        let result = seal(&zero_point, b"secret", [3; 32], [4; 24]);

        assert_eq!(result, Err(CryptoError::NonContributory));
    }

    #[test]
    fn fresh_randomness_changes_box() {
        let pair = recipient();
        let a = seal(pair.public_key(), b"same", [1; 32], [1; 24]).unwrap();
        let b = seal(pair.public_key(), b"same", [2; 32], [1; 24]).unwrap();

        assert_ne!(a.ephemeral_public, b.ephemeral_public);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn encoding_roundtrip_and_layout() {
        let pair = recipient();
        let sealed = seal(pair.public_key(), b"layout", [6; 32], [7; 24]).unwrap();
        let bytes = sealed.to_bytes();

        assert_eq!(bytes.len(), 32 + 24 + 6 + 16);
        assert_eq!(&bytes[32..56], &[7u8; 24]);
        assert_eq!(SealedBox::from_bytes(&bytes).unwrap(), sealed);
    }

    #[test]
    fn truncated_encoding_rejected() {
        let result = SealedBox::from_bytes(&[0u8; 71]);
        assert_eq!(result, Err(CryptoError::Malformed { len: 71, min: 72 }));
    }
}
