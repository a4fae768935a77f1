//! Execution dispatcher: runs one entry through its processor.
//!
//! ## Per-entry state machine
//!
//! ```text
//! Received → Resolving ──(no processor)──────────→ NoMatchProcessorName
//!               ↓
//!           Validating ──(violations)────────────→ DataValidationError
//!               ↓  (emit ProcessStarting)
//!           Executing ──(handler Ok)─────────────→ ExecutionSuccessfullyComplete
//!                     └─(handler Err or panic)───→ ExecutionFailedError
//! ```
//!
//! A correlation id is minted on receipt and carried by every event of the
//! attempt. Every path ends in exactly one terminal event and nothing is
//! re-raised to the caller, so one poison entry cannot take the consumer
//! down. Redelivery, if any, belongs to the transport.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde_json::{Value as JsonValue, json};
use tracing::{Instrument, debug, info_span, warn};

use taskrail_core::{CorrelationId, DispatchHandle, EntryValidator, ProcessorRegistry, TaskEntry};
use taskrail_events::{LifecycleEvent, LifecycleEventKind, ListenerSet};

/// Where an entry is in its processing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    Received,
    Resolving,
    Validating,
    Executing,
    Succeeded,
    Failed,
}

/// Result of dispatching one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub correlation_id: CorrelationId,
    pub processor_type: String,
    pub terminal: LifecycleEventKind,
}

impl DispatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.terminal == LifecycleEventKind::ExecutionSuccessfullyComplete
    }
}

pub struct ExecutionDispatcher {
    registry: Arc<ProcessorRegistry>,
    validator: Arc<EntryValidator>,
    listeners: ListenerSet,
}

impl ExecutionDispatcher {
    pub fn new(validator: Arc<EntryValidator>, listeners: ListenerSet) -> Self {
        Self {
            registry: Arc::clone(validator.registry()),
            validator,
            listeners,
        }
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    pub fn validator(&self) -> &Arc<EntryValidator> {
        &self.validator
    }

    /// Process one entry to its terminal event.
    ///
    /// `handle` is passed to the processor for follow-up submissions.
    pub async fn dispatch(&self, entry: TaskEntry, handle: DispatchHandle<'_>) -> DispatchOutcome {
        let correlation_id = CorrelationId::new();
        let processor_type = entry.task_type().to_string();
        let span = info_span!(
            "dispatch",
            correlation_id = %correlation_id,
            processor_type = %processor_type,
            transport = handle.transport_name(),
        );

        async move {
            let terminal = self.run(correlation_id, &processor_type, entry, handle).await;
            DispatchOutcome {
                correlation_id,
                processor_type,
                terminal,
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        correlation_id: CorrelationId,
        processor_type: &str,
        entry: TaskEntry,
        handle: DispatchHandle<'_>,
    ) -> LifecycleEventKind {
        debug!(state = ?ExecutionState::Received, created_at_epoch_ms = entry.created_at_epoch_ms());

        debug!(state = ?ExecutionState::Resolving);
        let Some(processor) = self.registry.get(processor_type) else {
            warn!("no processor registered for entry type");
            let payload = json!({ "entry": envelope(&entry) });
            return self
                .emit(LifecycleEventKind::NoMatchProcessorName, correlation_id, processor_type, payload)
                .await;
        };

        debug!(state = ?ExecutionState::Validating);
        let violations = self
            .validator
            .validate_payload(&processor, entry.data(), entry.metadata())
            .await;
        if !violations.is_empty() {
            warn!(?violations, "entry failed validation");
            let payload = json!({ "violations": violations });
            return self
                .emit(LifecycleEventKind::DataValidationError, correlation_id, processor_type, payload)
                .await;
        }

        let payload = json!({ "entry": envelope(&entry) });
        self.emit(LifecycleEventKind::ProcessStarting, correlation_id, processor_type, payload)
            .await;

        debug!(state = ?ExecutionState::Executing);
        let started = Instant::now();
        let (data, metadata) = entry.into_payload();
        let result = AssertUnwindSafe(processor.handler().handle(data, metadata, handle))
            .catch_unwind()
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let failure = match result {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(format!("{err:#}")),
            Err(panic) => Some(panic_message(panic.as_ref())),
        };

        match failure {
            None => {
                debug!(state = ?ExecutionState::Succeeded, elapsed_ms);
                let payload = json!({ "elapsedMs": elapsed_ms });
                self.emit(
                    LifecycleEventKind::ExecutionSuccessfullyComplete,
                    correlation_id,
                    processor_type,
                    payload,
                )
                .await
            }
            Some(error) => {
                warn!(state = ?ExecutionState::Failed, elapsed_ms, error = %error, "processor failed");
                let payload = json!({ "error": error, "elapsedMs": elapsed_ms });
                self.emit(
                    LifecycleEventKind::ExecutionFailedError,
                    correlation_id,
                    processor_type,
                    payload,
                )
                .await
            }
        }
    }

    async fn emit(
        &self,
        kind: LifecycleEventKind,
        correlation_id: CorrelationId,
        processor_type: &str,
        payload: JsonValue,
    ) -> LifecycleEventKind {
        let event = LifecycleEvent::new(kind, correlation_id, processor_type, payload);
        self.listeners.notify(&event).await;
        kind
    }
}

fn envelope(entry: &TaskEntry) -> JsonValue {
    serde_json::to_value(entry).unwrap_or_default()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
