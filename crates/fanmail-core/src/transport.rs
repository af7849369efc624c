//! Message transport boundary.

use std::sync::Arc;

use async_trait::async_trait;
use fanmail_proto::{Alias, MessageBundle, SubmitRequest};

use crate::error::TransportError;

/// Client of the message transport, acting as one authenticated alias.
///
/// The transport stores and relays bundles without reading them.
#[async_trait]
pub trait MessageTransport: Send + Sync + 'static {
    /// Hand a sealed message to the transport. The sender is the
    /// authenticated alias.
    async fn submit(&self, request: SubmitRequest) -> Result<(), TransportError>;

    /// Bundles in the conversation with `subject`, in transport order.
    async fn fetch(&self, subject: &Alias) -> Result<Vec<MessageBundle>, TransportError>;
}

#[async_trait]
impl<T: MessageTransport + ?Sized> MessageTransport for Arc<T> {
    async fn submit(&self, request: SubmitRequest) -> Result<(), TransportError> {
        (**self).submit(request).await
    }

    async fn fetch(&self, subject: &Alias) -> Result<Vec<MessageBundle>, TransportError> {
        (**self).fetch(subject).await
    }
}
