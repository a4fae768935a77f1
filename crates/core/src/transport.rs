//! Transport capability (delivery mechanics only).
//!
//! A transport moves a [`TaskEntry`] from the submitting side to the
//! execution dispatcher. Two strategies exist:
//!
//! - **Local**: the dispatcher runs in the caller's own call stack.
//! - **Remote**: the entry goes to a durable queue grouped by task type, plus
//!   a notification channel for start signals and out-of-band execution.
//!
//! The strategy is picked once when the [`DispatchManager`](crate::DispatchManager)
//! is built. Transports surface failures as [`TransportError`]; the manager
//! and [`DispatchHandle`](crate::DispatchHandle) decide how they degrade.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::TaskEntry;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("queue send failed: {0}")]
    Queue(String),

    #[error("notification publish failed: {0}")]
    Notification(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The local transport found no processor for the entry's type.
    #[error("no processor registered for type {0}")]
    UnknownType(String),
}

#[async_trait]
pub trait TaskTransport: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Deliver an entry for normal (ordered) processing.
    async fn send(&self, entry: &TaskEntry) -> Result<String, TransportError>;

    /// Deliver an entry for immediate, out-of-band processing.
    async fn send_immediate(&self, entry: &TaskEntry) -> Result<String, TransportError>;

    /// Wake idle consumer capacity.
    async fn send_start_signal(&self) -> Result<String, TransportError>;

    /// Approximate count of entries not yet picked up.
    async fn pending_count(&self) -> Result<u64, TransportError>;
}

#[async_trait]
impl<T> TaskTransport for Arc<T>
where
    T: TaskTransport + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn send(&self, entry: &TaskEntry) -> Result<String, TransportError> {
        (**self).send(entry).await
    }

    async fn send_immediate(&self, entry: &TaskEntry) -> Result<String, TransportError> {
        (**self).send_immediate(entry).await
    }

    async fn send_start_signal(&self) -> Result<String, TransportError> {
        (**self).send_start_signal().await
    }

    async fn pending_count(&self) -> Result<u64, TransportError> {
        (**self).pending_count().await
    }
}
