//! Seal key derivation using HKDF

use hkdf::Hkdf;
use sha2::Sha256;

use super::keys::KEY_SIZE;

/// Label used for seal key derivation
const SEAL_KEY_LABEL: &[u8] = b"fanmailSealV1";

/// Derive the symmetric key for one sealed box.
///
/// The ECDH shared secret is the input keying material. The info parameter
/// binds the key to both the ephemeral and the recipient public key.
///
/// # Security
///
/// - Different ephemeral keys produce different seal keys
/// - Different recipients produce different seal keys, even if the shared
///   secret were somehow equal
/// - Deterministic: same inputs always produce same output
pub fn derive_seal_key(
    shared_secret: &[u8; KEY_SIZE],
    ephemeral_public: &[u8; KEY_SIZE],
    recipient_public: &[u8; KEY_SIZE],
) -> [u8; 32] {
    let hkdf = Hkdf::<Sha256>::new(None, shared_secret);

    // label || ephemeral || recipient
    let mut info = Vec::with_capacity(SEAL_KEY_LABEL.len() + 2 * KEY_SIZE);
    info.extend_from_slice(SEAL_KEY_LABEL);
    info.extend_from_slice(ephemeral_public);
    info.extend_from_slice(recipient_public);

    let mut key = [0u8; 32];
    let Ok(()) = hkdf.expand(&info, &mut key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    key
}
