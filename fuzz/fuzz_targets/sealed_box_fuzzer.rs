//! Fuzz target for sealed box parsing and opening
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary input parsed as a sealed box and opened
//! - Tampering: a valid box with one byte flipped
//! - Round trip: a valid box opened with the right key
//!
//! # Invariants
//!
//! - Parsing and opening NEVER panic
//! - A tampered box never opens
//! - An untouched box opens to exactly the sealed plaintext

#![no_main]

use arbitrary::Arbitrary;
use fanmail_crypto::{open, seal, KeyPair, SealedBox};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Input {
    RawBytes { key_seed: [u8; 32], bytes: Vec<u8> },
    Tampered { key_seed: [u8; 32], sealed: Sealed, flip_index: u16, flip_mask: u8 },
    RoundTrip { key_seed: [u8; 32], sealed: Sealed },
}

#[derive(Debug, Arbitrary)]
struct Sealed {
    plaintext: Vec<u8>,
    ephemeral_seed: [u8; 32],
    nonce: [u8; 24],
}

fuzz_target!(|input: Input| {
    match input {
        Input::RawBytes { key_seed, bytes } => {
            let pair = KeyPair::from_seed(key_seed);
            if let Ok(sealed) = SealedBox::from_bytes(&bytes) {
                let _ = open(pair.private_key(), &sealed);
            }
        },

        Input::Tampered { key_seed, sealed, flip_index, flip_mask } => {
            if flip_mask == 0 {
                return;
            }
            let pair = KeyPair::from_seed(key_seed);
            let Ok(sealed) =
                seal(pair.public_key(), &sealed.plaintext, sealed.ephemeral_seed, sealed.nonce)
            else {
                return;
            };

            let mut bytes = sealed.to_bytes();
            let index = usize::from(flip_index) % bytes.len();
            bytes[index] ^= flip_mask;

            if let Ok(tampered) = SealedBox::from_bytes(&bytes) {
                assert!(open(pair.private_key(), &tampered).is_err(), "tampered box opened");
            }
        },

        Input::RoundTrip { key_seed, sealed } => {
            let pair = KeyPair::from_seed(key_seed);
            let Ok(boxed) =
                seal(pair.public_key(), &sealed.plaintext, sealed.ephemeral_seed, sealed.nonce)
            else {
                return;
            };

            let parsed = SealedBox::from_bytes(&boxed.to_bytes()).expect("own encoding parses");
            let opened = open(pair.private_key(), &parsed).expect("untouched box opens");
            assert_eq!(opened, sealed.plaintext);
        },
    }
});
