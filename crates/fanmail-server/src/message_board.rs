//! Message board for relaying sealed bundles.
//!
//! Stores bundles as submitted and never looks inside them. A fetch by A for
//! subject B returns the whole conversation between the two: everything A sent
//! to B and everything B sent to A, newest first.

#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::sync::{Arc, Mutex};

use fanmail_proto::{
    Alias, CipherEntry, FetchRequest, FetchResponse, MessageBundle, SubmitRequest, decode, encode,
};

use crate::error::ServiceError;

/// One stored submission.
#[derive(Debug, Clone)]
struct StoredMessage {
    sender: Alias,
    recipient: Alias,
    ciphers: Vec<CipherEntry>,
}

impl StoredMessage {
    fn between(&self, a: &Alias, b: &Alias) -> bool {
        (&self.sender == a && &self.recipient == b) || (&self.sender == b && &self.recipient == a)
    }
}

/// In-memory message board.
///
/// Thread-safe via Arc<Mutex<_>>. Clone shares the same underlying storage.
#[derive(Clone, Default)]
pub struct MessageBoard {
    /// Submissions in arrival order
    messages: Arc<Mutex<Vec<StoredMessage>>>,
}

impl MessageBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a bundle sent by `sender`, the authenticated alias.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn submit(&self, sender: &Alias, request: SubmitRequest) -> Result<(), ServiceError> {
        if request.ciphers.is_empty() {
            return Err(ServiceError::EmptyBundle);
        }

        let mut messages = self.messages.lock().expect("MessageBoard mutex poisoned");
        tracing::debug!(
            %sender,
            recipient = %request.recipient,
            ciphers = request.ciphers.len(),
            "stored bundle"
        );
        messages.push(StoredMessage {
            sender: sender.clone(),
            recipient: request.recipient,
            ciphers: request.ciphers,
        });

        Ok(())
    }

    /// Conversation between `requester` and the subject, newest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fetch(&self, requester: &Alias, request: &FetchRequest) -> FetchResponse {
        let messages = self.messages.lock().expect("MessageBoard mutex poisoned");

        let messages = messages
            .iter()
            .rev()
            .filter(|message| message.between(requester, &request.subject))
            .map(|message| MessageBundle {
                sender: message.sender.clone(),
                ciphers: message.ciphers.clone(),
            })
            .collect();

        FetchResponse { messages }
    }

    /// Total stored submissions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn len(&self) -> usize {
        self.messages.lock().expect("MessageBoard mutex poisoned").len()
    }

    /// Whether nothing was submitted yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle an encoded submit request.
    pub fn serve_submit(&self, sender: &Alias, request: &[u8]) -> Result<(), ServiceError> {
        let request: SubmitRequest = decode(request)?;
        self.submit(sender, request)
    }

    /// Handle an encoded fetch request, returning the encoded response.
    pub fn serve_fetch(&self, requester: &Alias, request: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let request: FetchRequest = decode(request)?;
        Ok(encode(&self.fetch(requester, &request))?)
    }
}
