//! Boundary capabilities consumed by the remote transport.
//!
//! Receiving from the queue is outside this crate; consumers hand message
//! bodies to [`RemoteConsumer`](crate::consumer::RemoteConsumer).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

/// A message for the durable queue.
///
/// Messages sharing a `group_key` are delivered in send order relative to
/// each other; nothing is promised across groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub group_key: String,
    pub body: String,
}

#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Enqueue a message, returning its id.
    async fn send(&self, message: QueueMessage) -> Result<String, PortError>;

    /// Approximate number of undelivered messages (eventually consistent).
    async fn approximate_depth(&self) -> Result<u64, PortError>;
}

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Publish a message to every subscriber, returning its id.
    async fn publish(&self, body: String) -> Result<String, PortError>;
}

#[async_trait]
impl<Q> QueueTransport for Arc<Q>
where
    Q: QueueTransport + ?Sized,
{
    async fn send(&self, message: QueueMessage) -> Result<String, PortError> {
        (**self).send(message).await
    }

    async fn approximate_depth(&self) -> Result<u64, PortError> {
        (**self).approximate_depth().await
    }
}

#[async_trait]
impl<N> NotificationTransport for Arc<N>
where
    N: NotificationTransport + ?Sized,
{
    async fn publish(&self, body: String) -> Result<String, PortError> {
        (**self).publish(body).await
    }
}
