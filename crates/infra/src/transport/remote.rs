//! Remote transport: durable queue + notification channel.
//!
//! - `send`: envelope to the queue, grouped by task type, so entries of one
//!   type are consumed in submission order (no ordering across types)
//! - `send_immediate`: envelope wrapped as [`Notification::Immediate`] on
//!   the notification channel, bypassing the queue
//! - `send_start_signal`: the fixed [`Notification::Start`] marker
//! - `pending_count`: the queue's approximate depth
//!
//! Delivery is at-least-once; duplicates are the handlers' problem.

use async_trait::async_trait;
use tracing::debug;

use taskrail_core::{TaskEntry, TaskTransport, TransportError};
use taskrail_events::{Notification, encode_entry};

use super::ports::{NotificationTransport, QueueMessage, QueueTransport};

#[derive(Debug)]
pub struct RemoteTransport<Q, N> {
    queue: Q,
    notifier: N,
}

impl<Q, N> RemoteTransport<Q, N> {
    pub fn new(queue: Q, notifier: N) -> Self {
        Self { queue, notifier }
    }

    pub fn into_parts(self) -> (Q, N) {
        (self.queue, self.notifier)
    }
}

impl<Q, N> RemoteTransport<Q, N>
where
    N: NotificationTransport,
{
    async fn notify(&self, notification: Notification) -> Result<String, TransportError> {
        let body = notification
            .encode()
            .map_err(|e| TransportError::Serialization(e.to_string()))?;
        self.notifier
            .publish(body)
            .await
            .map_err(|e| TransportError::Notification(e.to_string()))
    }
}

#[async_trait]
impl<Q, N> TaskTransport for RemoteTransport<Q, N>
where
    Q: QueueTransport,
    N: NotificationTransport,
{
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn send(&self, entry: &TaskEntry) -> Result<String, TransportError> {
        let body = encode_entry(entry).map_err(|e| TransportError::Serialization(e.to_string()))?;
        let message = QueueMessage {
            group_key: entry.task_type().to_string(),
            body,
        };
        let id = self
            .queue
            .send(message)
            .await
            .map_err(|e| TransportError::Queue(e.to_string()))?;
        debug!(message_id = %id, task_type = entry.task_type(), "entry enqueued");
        Ok(id)
    }

    async fn send_immediate(&self, entry: &TaskEntry) -> Result<String, TransportError> {
        self.notify(Notification::Immediate {
            entry: entry.clone(),
        })
        .await
    }

    async fn send_start_signal(&self) -> Result<String, TransportError> {
        self.notify(Notification::Start).await
    }

    async fn pending_count(&self) -> Result<u64, TransportError> {
        self.queue
            .approximate_depth()
            .await
            .map_err(|e| TransportError::Queue(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use taskrail_events::{START_MARKER, decode_entry};

    use crate::transport::{InMemoryNotifier, InMemoryQueue};

    fn transport() -> (
        RemoteTransport<Arc<InMemoryQueue>, Arc<InMemoryNotifier>>,
        Arc<InMemoryQueue>,
        Arc<InMemoryNotifier>,
    ) {
        let queue = Arc::new(InMemoryQueue::new());
        let notifier = Arc::new(InMemoryNotifier::new());
        (RemoteTransport::new(queue.clone(), notifier.clone()), queue, notifier)
    }

    #[tokio::test]
    async fn send_groups_by_task_type() {
        let (t, queue, _) = transport();
        let entry = TaskEntry::new("Invoice", json!({"id": 1}), json!({}));

        t.send(&entry).await.unwrap();

        let sent = queue.pop_group("Invoice").unwrap();
        assert_eq!(sent.group_key, "Invoice");
        assert_eq!(decode_entry(&sent.body).unwrap(), entry);
    }

    #[tokio::test]
    async fn immediate_and_start_go_to_the_notification_channel() {
        let (t, queue, notifier) = transport();
        let entry = TaskEntry::new("Invoice", json!({}), json!({}));

        t.send_immediate(&entry).await.unwrap();
        t.send_start_signal().await.unwrap();

        assert_eq!(queue.approximate_depth().await.unwrap(), 0);
        let published = notifier.published();
        assert_eq!(
            Notification::decode(&published[0]).unwrap(),
            Notification::Immediate { entry }
        );
        assert_eq!(published[1], START_MARKER);
    }

    #[tokio::test]
    async fn pending_count_reflects_queue_depth() {
        let (t, _, _) = transport();
        for i in 0..3 {
            t.send(&TaskEntry::new("A", json!(i), json!({}))).await.unwrap();
        }
        assert_eq!(t.pending_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn port_failures_map_to_transport_errors() {
        let (t, queue, notifier) = transport();
        queue.set_unavailable(true);
        notifier.set_unavailable(true);
        let entry = TaskEntry::new("A", json!({}), json!({}));

        assert!(matches!(t.send(&entry).await, Err(TransportError::Queue(_))));
        assert!(matches!(t.send_immediate(&entry).await, Err(TransportError::Notification(_))));
        assert!(matches!(t.send_start_signal().await, Err(TransportError::Notification(_))));
        assert!(matches!(t.pending_count().await, Err(TransportError::Queue(_))));
    }
}
