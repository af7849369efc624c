//! Fuzz target for wire message decoding
//!
//! Feeds arbitrary bytes to the CBOR codec as every directory and transport
//! message type, and arbitrary text to the base64 cipher entry decoder.
//!
//! # Invariants
//!
//! - Decoding NEVER panics; malformed input returns an error
//! - Anything that decodes re-encodes
//! - Decoded aliases are never empty

#![no_main]

use fanmail_proto::{
    decode, encode, CipherEntry, FetchRequest, FetchResponse, KeyId, LookupRequest,
    LookupResponse, RegisterKeyRequest, SubmitRequest,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = decode::<RegisterKeyRequest>(data) {
        assert!(encode(&request).is_ok());
    }

    if let Ok(request) = decode::<LookupRequest>(data) {
        assert!(!request.subject.as_str().is_empty());
        assert!(encode(&request).is_ok());
    }

    if let Ok(response) = decode::<LookupResponse>(data) {
        assert!(encode(&response).is_ok());
    }

    if let Ok(request) = decode::<SubmitRequest>(data) {
        for entry in &request.ciphers {
            let _ = entry.sealed_bytes();
        }
        assert!(encode(&request).is_ok());
    }

    if let Ok(request) = decode::<FetchRequest>(data) {
        assert!(encode(&request).is_ok());
    }

    if let Ok(response) = decode::<FetchResponse>(data) {
        for bundle in &response.messages {
            assert!(!bundle.sender.as_str().is_empty());
        }
        assert!(encode(&response).is_ok());
    }

    // Raw text as a cipher entry body
    if let Ok(text) = std::str::from_utf8(data) {
        let entry = CipherEntry { key_id: KeyId::from_bytes([0; 16]), cipher_text: text.into() };
        let _ = entry.sealed_bytes();
    }
});
