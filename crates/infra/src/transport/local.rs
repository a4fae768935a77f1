//! In-process transport for local runs and tests.
//!
//! - No queue, no concurrency: `send` runs the dispatcher before returning
//! - Handler failures only surface as lifecycle events
//! - Entries submitted by a handler are processed depth-first, inline

use std::sync::Arc;

use async_trait::async_trait;

use taskrail_core::{DispatchHandle, TaskEntry, TaskTransport, TransportError};
use taskrail_events::LifecycleEventKind;

use crate::dispatcher::ExecutionDispatcher;

/// Returned by [`LocalTransport`] for a start signal; nothing happens.
pub const LOCAL_START_SENTINEL: &str = "local:start:noop";

pub struct LocalTransport {
    dispatcher: Arc<ExecutionDispatcher>,
}

impl LocalTransport {
    pub fn new(dispatcher: Arc<ExecutionDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Dispatch inline and describe the result as `local:<correlation id>:<terminal kind>`.
    async fn run(&self, entry: &TaskEntry) -> Result<String, TransportError> {
        let outcome = self
            .dispatcher
            .dispatch(entry.clone(), DispatchHandle::new(self))
            .await;

        match outcome.terminal {
            LifecycleEventKind::NoMatchProcessorName => {
                Err(TransportError::UnknownType(outcome.processor_type))
            }
            terminal => Ok(format!("local:{}:{}", outcome.correlation_id, terminal)),
        }
    }
}

#[async_trait]
impl TaskTransport for LocalTransport {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn send(&self, entry: &TaskEntry) -> Result<String, TransportError> {
        self.run(entry).await
    }

    async fn send_immediate(&self, entry: &TaskEntry) -> Result<String, TransportError> {
        self.run(entry).await
    }

    async fn send_start_signal(&self) -> Result<String, TransportError> {
        Ok(LOCAL_START_SENTINEL.to_string())
    }

    async fn pending_count(&self) -> Result<u64, TransportError> {
        Ok(0)
    }
}
