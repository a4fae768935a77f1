//! Lifecycle listeners and ordered fan-out.
//!
//! The dispatcher hands every event to a [`ListenerSet`], which awaits each
//! listener in registration order before moving on. Each sink therefore
//! sees an entry's events in the order they happened; a slow sink delays the
//! dispatcher for that entry.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::error;

use crate::LifecycleEvent;

/// Audit/log sink for dispatcher events.
///
/// Implementations handle their own errors; a panic is caught and logged by
/// the [`ListenerSet`].
#[async_trait]
pub trait LifecycleListener: Send + Sync {
    async fn on_event(&self, event: &LifecycleEvent);

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[async_trait]
impl<L> LifecycleListener for Arc<L>
where
    L: LifecycleListener + ?Sized,
{
    async fn on_event(&self, event: &LifecycleEvent) {
        (**self).on_event(event).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Ordered, sequential fan-out over listeners.
#[derive(Clone, Default)]
pub struct ListenerSet {
    listeners: Vec<Arc<dyn LifecycleListener>>,
}

impl ListenerSet {
    pub fn new(listeners: Vec<Arc<dyn LifecycleListener>>) -> Self {
        Self { listeners }
    }

    pub fn push(&mut self, listener: Arc<dyn LifecycleListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every listener, one after the other.
    pub async fn notify(&self, event: &LifecycleEvent) {
        for listener in &self.listeners {
            let delivered = AssertUnwindSafe(listener.on_event(event))
                .catch_unwind()
                .await;
            if delivered.is_err() {
                error!(
                    listener = listener.name(),
                    kind = %event.kind(),
                    correlation_id = %event.correlation_id(),
                    "lifecycle listener panicked"
                );
            }
        }
    }
}

impl core::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.listeners.iter().map(|l| l.name()))
            .finish()
    }
}
