//! In-memory event log for tests/dev.

use std::sync::Mutex;

use async_trait::async_trait;
use taskrail_core::CorrelationId;

use crate::{LifecycleEvent, LifecycleEventKind, LifecycleListener};

/// Listener that keeps every event it receives, in arrival order.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<LifecycleEventKind> {
        self.events().iter().map(LifecycleEvent::kind).collect()
    }

    /// Events of one execution attempt.
    pub fn for_correlation(&self, correlation_id: CorrelationId) -> Vec<LifecycleEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.correlation_id() == correlation_id)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

#[async_trait]
impl LifecycleListener for InMemoryEventLog {
    async fn on_event(&self, event: &LifecycleEvent) {
        // A poisoned lock only loses test observations.
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }

    fn name(&self) -> &str {
        "in-memory-log"
    }
}
