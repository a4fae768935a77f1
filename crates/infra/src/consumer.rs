//! Consumer-side entry point for the remote transport.
//!
//! Pulling messages is the transport's business (a queue poller, a pub/sub
//! subscription, a serverless trigger). Whatever pulls hands the raw body to
//! [`RemoteConsumer`], which decodes it and runs the dispatcher.
//!
//! An undecodable body is returned as [`ConsumerError::Decode`] so the
//! transport can apply its own redelivery or dead-letter policy. A body that
//! decodes always reaches a terminal lifecycle event, whatever its handler
//! does.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use taskrail_core::{DispatchHandle, TaskTransport};
use taskrail_events::{CodecError, Notification, decode_entry};

use crate::dispatcher::{DispatchOutcome, ExecutionDispatcher};

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("undecodable message: {0}")]
    Decode(#[from] CodecError),
}

/// What a notification turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Start marker; the caller should go look at the queue.
    Woken,
    /// An immediate request that was dispatched.
    Dispatched(DispatchOutcome),
}

pub struct RemoteConsumer {
    dispatcher: Arc<ExecutionDispatcher>,
    /// Where handlers' follow-up submissions go.
    outbound: Arc<dyn TaskTransport>,
}

impl RemoteConsumer {
    pub fn new(dispatcher: Arc<ExecutionDispatcher>, outbound: Arc<dyn TaskTransport>) -> Self {
        Self {
            dispatcher,
            outbound,
        }
    }

    /// Handle one body pulled from the durable queue.
    pub async fn on_queue_message(&self, body: &str) -> Result<DispatchOutcome, ConsumerError> {
        let entry = decode_entry(body).inspect_err(|e| {
            error!(error = %e, "dropping undecodable queue message");
        })?;
        debug!(task_type = entry.task_type(), "queue message received");
        Ok(self
            .dispatcher
            .dispatch(entry, DispatchHandle::new(self.outbound.as_ref()))
            .await)
    }

    /// Handle one body received on the notification channel.
    pub async fn on_notification(&self, body: &str) -> Result<NotificationOutcome, ConsumerError> {
        let notification = Notification::decode(body).inspect_err(|e| {
            error!(error = %e, "dropping undecodable notification");
        })?;

        match notification {
            Notification::Start => {
                info!("start signal received");
                Ok(NotificationOutcome::Woken)
            }
            Notification::Immediate { entry } => {
                debug!(task_type = entry.task_type(), "immediate request received");
                let outcome = self
                    .dispatcher
                    .dispatch(entry, DispatchHandle::new(self.outbound.as_ref()))
                    .await;
                Ok(NotificationOutcome::Dispatched(outcome))
            }
        }
    }
}
