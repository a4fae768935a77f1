use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use taskrail_events::{LifecycleEvent, LifecycleListener};
use taskrail_observability::current_trace_id;

use super::record::AuditRecord;
use super::store::AuditStore;

/// Writes one audit record per lifecycle event.
pub struct AuditTableSink {
    store: Arc<dyn AuditStore>,
    environment: String,
}

impl AuditTableSink {
    pub fn new(store: Arc<dyn AuditStore>, environment: impl Into<String>) -> Self {
        Self {
            store,
            environment: environment.into(),
        }
    }
}

#[async_trait]
impl LifecycleListener for AuditTableSink {
    async fn on_event(&self, event: &LifecycleEvent) {
        let record = AuditRecord::from_event(event, &self.environment, None);
        if let Err(e) = self.store.append(record).await {
            error!(sink = "audit", error = %e, correlation_id = %event.correlation_id(), "audit write failed");
        }
    }

    fn name(&self) -> &str {
        "audit-table"
    }
}

/// Writes one log record per lifecycle event, tagged with the trace id of
/// the request that triggered it (when there is one).
pub struct LogTableSink {
    store: Arc<dyn AuditStore>,
    environment: String,
}

impl LogTableSink {
    pub fn new(store: Arc<dyn AuditStore>, environment: impl Into<String>) -> Self {
        Self {
            store,
            environment: environment.into(),
        }
    }
}

#[async_trait]
impl LifecycleListener for LogTableSink {
    async fn on_event(&self, event: &LifecycleEvent) {
        let record = AuditRecord::from_event(event, &self.environment, current_trace_id());
        if let Err(e) = self.store.append(record).await {
            error!(sink = "log", error = %e, correlation_id = %event.correlation_id(), "log write failed");
        }
    }

    fn name(&self) -> &str {
        "log-table"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use taskrail_core::CorrelationId;
    use taskrail_events::LifecycleEventKind;
    use taskrail_observability::with_trace_id;

    use crate::audit::{AuditError, InMemoryAuditStore};

    struct DownStore;

    #[async_trait]
    impl AuditStore for DownStore {
        async fn append(&self, _record: AuditRecord) -> Result<(), AuditError> {
            Err(AuditError::Storage("connection refused".into()))
        }
    }

    fn event() -> LifecycleEvent {
        LifecycleEvent::new(
            LifecycleEventKind::ExecutionFailedError,
            CorrelationId::new(),
            "Invoice",
            json!({"error": "boom"}),
        )
    }

    #[tokio::test]
    async fn audit_sink_projects_the_event() {
        let store = Arc::new(InMemoryAuditStore::new());
        let sink = AuditTableSink::new(store.clone(), "staging");
        let ev = event();

        sink.on_event(&ev).await;

        let records = store.records();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.environment, "staging");
        assert_eq!(r.event_type, "ExecutionFailedError");
        assert_eq!(r.correlation_id, ev.correlation_id());
        assert_eq!(r.processor_type, "Invoice");
        assert_eq!(r.payload, json!({"error": "boom"}));
        assert_eq!(r.trace_id, None);
    }

    #[tokio::test]
    async fn log_sink_captures_the_trace_id() {
        let store = Arc::new(InMemoryAuditStore::new());
        let sink = LogTableSink::new(store.clone(), "prod");

        with_trace_id("req-7f3a", sink.on_event(&event())).await;
        sink.on_event(&event()).await;

        let traces: Vec<_> = store.records().into_iter().map(|r| r.trace_id).collect();
        assert_eq!(traces, vec![Some("req-7f3a".to_string()), None]);
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let sink = AuditTableSink::new(Arc::new(DownStore), "dev");
        sink.on_event(&event()).await;
    }
}
