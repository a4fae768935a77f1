//! Task submission API.
//!
//! Every submission call degrades instead of failing: transport errors are
//! logged and come back as `None` (or an error string in a batch slot), which
//! callers must read as "not confirmed dispatched". The only loud path is
//! [`DispatchManager::submit_new`], which raises [`ValidationError`] before
//! any transport work happens.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{error, warn};

use crate::transport::{TaskTransport, TransportError};
use crate::validator::EntryValidator;
use crate::{TaskEntry, ValidationError};

/// One slot of a batch submission: the transport id, or the error message.
pub type BatchSlot = Result<String, String>;

/// Borrowed submission handle.
///
/// Handed to every processor so it can submit follow-up entries through the
/// same transport that is executing it. It borrows the transport, so there is
/// no ownership cycle between the dispatcher and the processors it runs.
#[derive(Clone, Copy)]
pub struct DispatchHandle<'a> {
    transport: &'a dyn TaskTransport,
}

impl<'a> DispatchHandle<'a> {
    pub fn new(transport: &'a dyn TaskTransport) -> Self {
        Self { transport }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub async fn submit(&self, entry: &TaskEntry) -> Option<String> {
        self.transport
            .send(entry)
            .await
            .map_err(|e| self.log_failure("submit", Some(entry), &e))
            .ok()
    }

    /// Submit entries one at a time, in order.
    ///
    /// Never concurrent: per-type ordering must hold across the whole batch.
    /// A failed slot does not stop the remaining entries.
    pub async fn submit_batch(&self, entries: &[TaskEntry]) -> Vec<BatchSlot> {
        let mut slots = Vec::with_capacity(entries.len());
        for entry in entries {
            let slot = self.transport.send(entry).await.map_err(|e| {
                self.log_failure("submit_batch", Some(entry), &e);
                e.to_string()
            });
            slots.push(slot);
        }
        slots
    }

    pub async fn fire_immediate(&self, entry: &TaskEntry) -> Option<String> {
        self.transport
            .send_immediate(entry)
            .await
            .map_err(|e| self.log_failure("fire_immediate", Some(entry), &e))
            .ok()
    }

    pub async fn fire_start_signal(&self) -> Option<String> {
        self.transport
            .send_start_signal()
            .await
            .map_err(|e| self.log_failure("fire_start_signal", None, &e))
            .ok()
    }

    /// Approximate backlog; `0` when the transport cannot be queried.
    pub async fn backlog_size(&self) -> u64 {
        self.transport
            .pending_count()
            .await
            .map_err(|e| self.log_failure("backlog_size", None, &e))
            .unwrap_or(0)
    }

    fn log_failure(&self, op: &'static str, entry: Option<&TaskEntry>, err: &TransportError) {
        let task_type = entry.map(TaskEntry::task_type).unwrap_or("-");
        match err {
            TransportError::UnknownType(_) => {
                warn!(transport = self.transport.name(), op, task_type, error = %err, "entry not dispatched");
            }
            _ => {
                error!(transport = self.transport.name(), op, task_type, error = %err, "transport failure");
            }
        }
    }
}

/// Owning submission API built on one transport strategy.
#[derive(Clone)]
pub struct DispatchManager {
    transport: Arc<dyn TaskTransport>,
    validator: Arc<EntryValidator>,
}

impl DispatchManager {
    pub fn new(transport: Arc<dyn TaskTransport>, validator: Arc<EntryValidator>) -> Self {
        Self {
            transport,
            validator,
        }
    }

    pub fn handle(&self) -> DispatchHandle<'_> {
        DispatchHandle::new(self.transport.as_ref())
    }

    pub fn transport(&self) -> &Arc<dyn TaskTransport> {
        &self.transport
    }

    pub fn validator(&self) -> &EntryValidator {
        &self.validator
    }

    pub async fn submit(&self, entry: &TaskEntry) -> Option<String> {
        self.handle().submit(entry).await
    }

    pub async fn submit_batch(&self, entries: &[TaskEntry]) -> Vec<BatchSlot> {
        self.handle().submit_batch(entries).await
    }

    pub async fn fire_immediate(&self, entry: &TaskEntry) -> Option<String> {
        self.handle().fire_immediate(entry).await
    }

    pub async fn fire_start_signal(&self) -> Option<String> {
        self.handle().fire_start_signal().await
    }

    pub async fn backlog_size(&self) -> u64 {
        self.handle().backlog_size().await
    }

    /// Build, strictly validate, and submit a new entry.
    ///
    /// Validation failures raise; transport failures degrade to `Ok(None)`.
    pub async fn submit_new(
        &self,
        task_type: impl Into<String>,
        data: JsonValue,
        metadata: JsonValue,
    ) -> Result<Option<String>, ValidationError> {
        let entry = TaskEntry::new(task_type, data, metadata);
        self.validator.validate_and_raise(&entry).await?;
        Ok(self.submit(&entry).await)
    }
}
