//! In-process adapters implementing the core collaborator traits.
//!
//! Each adapter is bound to one authenticated alias and pushes every request
//! and response through the CBOR wire codec, exactly as a networked client
//! would, so wire-level bugs surface in in-process tests too.

use async_trait::async_trait;
use fanmail_core::{DirectoryClient, DirectoryError, MessageTransport, TransportError};
use fanmail_crypto::PublicKey;
use fanmail_proto::{
    Alias, DeviceId, DirectoryEntry, FetchRequest, FetchResponse, KeyId, LookupRequest,
    LookupResponse, MessageBundle, RegisterKeyRequest, SubmitRequest, decode, encode,
};

use crate::{key_directory::KeyDirectory, message_board::MessageBoard};

/// [`DirectoryClient`] backed by an in-process [`KeyDirectory`].
#[derive(Clone)]
pub struct LocalDirectory {
    directory: KeyDirectory,
    alias: Alias,
}

impl LocalDirectory {
    /// Act as `alias` against `directory`.
    pub fn new(directory: KeyDirectory, alias: Alias) -> Self {
        Self { directory, alias }
    }

    /// Authenticated alias.
    pub fn alias(&self) -> &Alias {
        &self.alias
    }
}

#[async_trait]
impl DirectoryClient for LocalDirectory {
    async fn register(
        &self,
        device_id: DeviceId,
        key_id: KeyId,
        public_key: &PublicKey,
    ) -> Result<(), DirectoryError> {
        let request =
            encode(&RegisterKeyRequest { device_id, key_id, public_key: public_key.as_bytes().to_vec() })?;
        self.directory.serve_register(&self.alias, &request)?;
        Ok(())
    }

    async fn lookup(&self, subject: &Alias) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let request = encode(&LookupRequest { subject: subject.clone() })?;
        let response: LookupResponse = decode(&self.directory.serve_lookup(&request)?)?;
        Ok(response.entries)
    }
}

/// [`MessageTransport`] backed by an in-process [`MessageBoard`].
#[derive(Clone)]
pub struct LocalTransport {
    board: MessageBoard,
    alias: Alias,
}

impl LocalTransport {
    /// Act as `alias` against `board`.
    pub fn new(board: MessageBoard, alias: Alias) -> Self {
        Self { board, alias }
    }

    /// Authenticated alias.
    pub fn alias(&self) -> &Alias {
        &self.alias
    }
}

#[async_trait]
impl MessageTransport for LocalTransport {
    async fn submit(&self, request: SubmitRequest) -> Result<(), TransportError> {
        let request = encode(&request)?;
        self.board.serve_submit(&self.alias, &request)?;
        Ok(())
    }

    async fn fetch(&self, subject: &Alias) -> Result<Vec<MessageBundle>, TransportError> {
        let request = encode(&FetchRequest { subject: subject.clone() })?;
        let response: FetchResponse = decode(&self.board.serve_fetch(&self.alias, &request)?)?;
        Ok(response.messages)
    }
}
