//! Wire compatibility tests for collaborator messages.
//!
//! These pin down the parts of the format other implementations depend on:
//! field names, null handling for empty results, and alias validation at
//! the decode boundary.

use ciborium::Value;
use fanmail_proto::{
    Alias, CipherEntry, DeviceId, FetchResponse, KeyId, LookupResponse, MessageBundle,
    ProtocolError, RegisterKeyRequest, decode, encode,
};
use proptest::prelude::*;

fn cbor(value: &Value) -> Vec<u8> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).unwrap();
    bytes
}

fn map_keys(bytes: &[u8]) -> Vec<String> {
    let value: Value = ciborium::from_reader(bytes).unwrap();
    value
        .as_map()
        .unwrap()
        .iter()
        .filter_map(|(k, _)| k.as_text().map(str::to_string))
        .collect()
}

#[test]
fn null_messages_decode_as_empty() {
    let bytes = cbor(&Value::Map(vec![(Value::Text("messages".into()), Value::Null)]));
    let response: FetchResponse = decode(&bytes).unwrap();
    assert!(response.messages.is_empty());
}

#[test]
fn absent_messages_decode_as_empty() {
    let bytes = cbor(&Value::Map(vec![]));
    let response: FetchResponse = decode(&bytes).unwrap();
    assert!(response.messages.is_empty());
}

#[test]
fn absent_entries_decode_as_empty() {
    let bytes = cbor(&Value::Map(vec![]));
    let response: LookupResponse = decode(&bytes).unwrap();
    assert!(response.entries.is_empty());
}

#[test]
fn register_request_uses_camel_case_fields() {
    let request = RegisterKeyRequest {
        device_id: DeviceId::from_random_bytes([1; 16]),
        key_id: KeyId::from_random_bytes([2; 16]),
        public_key: vec![3; 32],
    };

    let keys = map_keys(&encode(&request).unwrap());
    assert_eq!(keys, vec!["deviceId", "keyId", "publicKey"]);
}

#[test]
fn cipher_entry_uses_camel_case_fields() {
    let entry = CipherEntry::from_sealed(KeyId::from_random_bytes([2; 16]), b"sealed");
    let keys = map_keys(&encode(&entry).unwrap());
    assert_eq!(keys, vec!["keyId", "cipherText"]);
}

#[test]
fn empty_sender_alias_rejected_on_decode() {
    let bytes = cbor(&Value::Map(vec![
        (Value::Text("sender".into()), Value::Text("  ".into())),
        (Value::Text("ciphers".into()), Value::Array(vec![])),
    ]));

    let result: Result<MessageBundle, ProtocolError> = decode(&bytes);
    assert!(matches!(result, Err(ProtocolError::Decode(_))));
}

proptest! {
    #[test]
    fn prop_fetch_response_preserves_bundle_order(
        senders in prop::collection::vec("[a-z]{1,12}", 0..8),
        seed in any::<u8>(),
    ) {
        let messages: Vec<MessageBundle> = senders
            .iter()
            .enumerate()
            .map(|(i, sender)| MessageBundle {
                sender: Alias::new(sender).unwrap(),
                ciphers: vec![CipherEntry::from_sealed(
                    KeyId::from_random_bytes([seed.wrapping_add(i as u8); 16]),
                    &[i as u8; 80],
                )],
            })
            .collect();
        let response = FetchResponse { messages };

        let decoded: FetchResponse = decode(&encode(&response).unwrap()).unwrap();

        prop_assert_eq!(decoded, response);
    }
}
