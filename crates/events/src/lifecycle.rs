use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use taskrail_core::CorrelationId;

/// Kind of state transition observed while processing one entry.
///
/// Every dispatched entry yields exactly one terminal kind; `ProcessStarting`
/// is the only non-terminal one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleEventKind {
    ProcessStarting,
    DataValidationError,
    ExecutionSuccessfullyComplete,
    ExecutionFailedError,
    NoMatchProcessorName,
}

impl LifecycleEventKind {
    pub fn is_terminal(self) -> bool {
        match self {
            LifecycleEventKind::ProcessStarting => false,
            LifecycleEventKind::DataValidationError
            | LifecycleEventKind::ExecutionSuccessfullyComplete
            | LifecycleEventKind::ExecutionFailedError
            | LifecycleEventKind::NoMatchProcessorName => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleEventKind::ProcessStarting => "ProcessStarting",
            LifecycleEventKind::DataValidationError => "DataValidationError",
            LifecycleEventKind::ExecutionSuccessfullyComplete => "ExecutionSuccessfullyComplete",
            LifecycleEventKind::ExecutionFailedError => "ExecutionFailedError",
            LifecycleEventKind::NoMatchProcessorName => "NoMatchProcessorName",
        }
    }
}

impl core::fmt::Display for LifecycleEventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transition in an entry's processing, as seen by listeners.
///
/// Payload by kind:
/// - `ProcessStarting`, `NoMatchProcessorName`: `{"entry": <wire envelope>}`
/// - `DataValidationError`: `{"violations": [..]}`
/// - `ExecutionSuccessfullyComplete`: `{"elapsedMs": ..}`
/// - `ExecutionFailedError`: `{"error": "..", "elapsedMs": ..}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    kind: LifecycleEventKind,
    correlation_id: CorrelationId,
    processor_type: String,
    payload: JsonValue,
    occurred_at: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(
        kind: LifecycleEventKind,
        correlation_id: CorrelationId,
        processor_type: impl Into<String>,
        payload: JsonValue,
    ) -> Self {
        Self {
            kind,
            correlation_id,
            processor_type: processor_type.into(),
            payload,
            occurred_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> LifecycleEventKind {
        self.kind
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn processor_type(&self) -> &str {
        &self.processor_type
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_process_starting_is_non_terminal() {
        let all = [
            LifecycleEventKind::ProcessStarting,
            LifecycleEventKind::DataValidationError,
            LifecycleEventKind::ExecutionSuccessfullyComplete,
            LifecycleEventKind::ExecutionFailedError,
            LifecycleEventKind::NoMatchProcessorName,
        ];
        let non_terminal: Vec<_> = all.into_iter().filter(|k| !k.is_terminal()).collect();
        assert_eq!(non_terminal, vec![LifecycleEventKind::ProcessStarting]);
    }

    #[test]
    fn kind_serializes_as_its_name() {
        let json = serde_json::to_string(&LifecycleEventKind::NoMatchProcessorName).unwrap();
        assert_eq!(json, r#""NoMatchProcessorName""#);
    }
}
