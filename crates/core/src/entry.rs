use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Immutable unit of work submitted for background processing.
///
/// This is also the wire envelope shared by both transports:
/// `{"createdAtEpochMs": .., "type": .., "data": .., "metadata": ..}`.
///
/// Notes:
/// - `task_type` only has to resolve to a registered processor at dispatch
///   time, not at construction time.
/// - Entries have no setters; build a new entry instead of mutating one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    created_at_epoch_ms: i64,

    #[serde(rename = "type")]
    task_type: String,

    #[serde(default)]
    data: JsonValue,

    #[serde(default)]
    metadata: JsonValue,
}

impl TaskEntry {
    /// Build an entry stamped with the current wall-clock time.
    ///
    /// Callers normally go through `EntryValidator::create` so the entry is
    /// checked against its processor's rules first.
    pub fn new(task_type: impl Into<String>, data: JsonValue, metadata: JsonValue) -> Self {
        Self::with_created_at(Utc::now().timestamp_millis(), task_type, data, metadata)
    }

    pub fn with_created_at(
        created_at_epoch_ms: i64,
        task_type: impl Into<String>,
        data: JsonValue,
        metadata: JsonValue,
    ) -> Self {
        Self {
            created_at_epoch_ms,
            task_type: task_type.into(),
            data,
            metadata,
        }
    }

    pub fn created_at_epoch_ms(&self) -> i64 {
        self.created_at_epoch_ms
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    pub fn data(&self) -> &JsonValue {
        &self.data
    }

    pub fn metadata(&self) -> &JsonValue {
        &self.metadata
    }

    /// Split into `(data, metadata)` for handing to a processor.
    pub fn into_payload(self) -> (JsonValue, JsonValue) {
        (self.data, self.metadata)
    }
}
