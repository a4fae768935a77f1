//! In-memory queue and notification channel for tests/dev.
//!
//! - No IO
//! - Global FIFO, which implies per-group FIFO
//! - Can be switched into an unavailable state to exercise failure paths

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use super::ports::{NotificationTransport, PortError, QueueMessage, QueueTransport};

#[derive(Debug, Default)]
pub struct InMemoryQueue {
    messages: Mutex<VecDeque<QueueMessage>>,
    next_id: AtomicU64,
    unavailable: AtomicBool,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Take the oldest message of one group.
    pub fn pop_group(&self, group_key: &str) -> Option<QueueMessage> {
        let mut messages = self.messages.lock().ok()?;
        let pos = messages.iter().position(|m| m.group_key == group_key)?;
        messages.remove(pos)
    }

    /// Take every message, oldest first.
    pub fn drain(&self) -> Vec<QueueMessage> {
        self.messages
            .lock()
            .map(|mut m| m.drain(..).collect())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), PortError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(PortError::Unavailable("in-memory queue switched off".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueue {
    async fn send(&self, message: QueueMessage) -> Result<String, PortError> {
        self.check_available()?;
        let mut messages = self
            .messages
            .lock()
            .map_err(|_| PortError::Unavailable("queue lock poisoned".into()))?;
        messages.push_back(message);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("mem-{id}"))
    }

    async fn approximate_depth(&self) -> Result<u64, PortError> {
        self.check_available()?;
        let messages = self
            .messages
            .lock()
            .map_err(|_| PortError::Unavailable("queue lock poisoned".into()))?;
        Ok(messages.len() as u64)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    published: Mutex<Vec<String>>,
    unavailable: AtomicBool,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<String> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Take every published message, oldest first.
    pub fn drain(&self) -> Vec<String> {
        self.published
            .lock()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationTransport for InMemoryNotifier {
    async fn publish(&self, body: String) -> Result<String, PortError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("in-memory notifier switched off".into()));
        }
        let mut published = self
            .published
            .lock()
            .map_err(|_| PortError::Unavailable("notifier lock poisoned".into()))?;
        published.push(body);
        Ok(format!("note-{}", published.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(group: &str, body: &str) -> QueueMessage {
        QueueMessage {
            group_key: group.into(),
            body: body.into(),
        }
    }

    #[tokio::test]
    async fn pop_group_preserves_per_group_order() {
        let queue = InMemoryQueue::new();
        for (g, b) in [("A", "a1"), ("B", "b1"), ("A", "a2")] {
            queue.send(msg(g, b)).await.unwrap();
        }

        assert_eq!(queue.pop_group("A").unwrap().body, "a1");
        assert_eq!(queue.pop_group("A").unwrap().body, "a2");
        assert!(queue.pop_group("A").is_none());
        assert_eq!(queue.approximate_depth().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let queue = InMemoryQueue::new();
        let a = queue.send(msg("A", "1")).await.unwrap();
        let b = queue.send(msg("A", "2")).await.unwrap();
        assert_ne!(a, b);
    }
}
