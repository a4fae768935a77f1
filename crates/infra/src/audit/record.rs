use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use taskrail_core::CorrelationId;
use taskrail_events::LifecycleEvent;

/// Append-only projection of a lifecycle event plus its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub environment: String,
    pub event_type: String,
    pub correlation_id: CorrelationId,
    pub processor_type: String,
    pub payload: JsonValue,
    pub trace_id: Option<String>,
}

impl AuditRecord {
    pub fn from_event(
        event: &LifecycleEvent,
        environment: impl Into<String>,
        trace_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            recorded_at: event.occurred_at(),
            environment: environment.into(),
            event_type: event.kind().as_str().to_string(),
            correlation_id: event.correlation_id(),
            processor_type: event.processor_type().to_string(),
            payload: event.payload().clone(),
            trace_id,
        }
    }
}
