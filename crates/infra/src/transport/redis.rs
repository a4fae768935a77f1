//! Redis-backed queue and notification channel (optional).
//!
//! ## Layout
//!
//! - **Group lists**: `<prefix>:<group>`; RPUSH on send, consumers pop from
//!   the head, so each group is FIFO
//! - **Group index**: `<prefix>:groups`, a set of every group ever used
//! - **Notifications**: PUBLISH on a single channel (not durable; a start
//!   signal nobody hears is harmless)
//!
//! Depth is the sum of the group list lengths, read without a transaction,
//! so it is only approximate.

use ::redis::AsyncCommands;
use tracing::instrument;
use uuid::Uuid;

use async_trait::async_trait;

use super::ports::{NotificationTransport, PortError, QueueMessage, QueueTransport};

/// Default key prefix for group lists.
pub const DEFAULT_QUEUE_PREFIX: &str = "taskrail:queue";

/// Default notification channel.
pub const DEFAULT_NOTIFY_CHANNEL: &str = "taskrail:notify";

#[derive(Debug, Clone)]
pub struct RedisQueue {
    client: ::redis::Client,
    prefix: String,
}

impl RedisQueue {
    pub fn new(redis_url: impl AsRef<str>, prefix: impl Into<String>) -> Result<Self, PortError> {
        let client = ::redis::Client::open(redis_url.as_ref())
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            prefix: prefix.into(),
        })
    }

    fn group_key(&self, group: &str) -> String {
        format!("{}:{}", self.prefix, group)
    }

    fn index_key(&self) -> String {
        format!("{}:groups", self.prefix)
    }

    async fn connection(&self) -> Result<::redis::aio::MultiplexedConnection, PortError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl QueueTransport for RedisQueue {
    #[instrument(skip(self, message), fields(group = %message.group_key), err)]
    async fn send(&self, message: QueueMessage) -> Result<String, PortError> {
        let mut conn = self.connection().await?;
        let id = Uuid::now_v7().to_string();

        let _: i64 = conn
            .sadd(self.index_key(), &message.group_key)
            .await
            .map_err(|e| PortError::Rejected(format!("SADD failed: {e}")))?;
        let _: i64 = conn
            .rpush(self.group_key(&message.group_key), &message.body)
            .await
            .map_err(|e| PortError::Rejected(format!("RPUSH failed: {e}")))?;

        Ok(id)
    }

    async fn approximate_depth(&self) -> Result<u64, PortError> {
        let mut conn = self.connection().await?;
        let groups: Vec<String> = conn
            .smembers(self.index_key())
            .await
            .map_err(|e| PortError::Rejected(format!("SMEMBERS failed: {e}")))?;

        let mut depth = 0u64;
        for group in groups {
            let len: u64 = conn
                .llen(self.group_key(&group))
                .await
                .map_err(|e| PortError::Rejected(format!("LLEN failed: {e}")))?;
            depth += len;
        }
        Ok(depth)
    }
}

#[derive(Debug, Clone)]
pub struct RedisNotifier {
    client: ::redis::Client,
    channel: String,
}

impl RedisNotifier {
    pub fn new(redis_url: impl AsRef<str>, channel: impl Into<String>) -> Result<Self, PortError> {
        let client = ::redis::Client::open(redis_url.as_ref())
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            channel: channel.into(),
        })
    }
}

#[async_trait]
impl NotificationTransport for RedisNotifier {
    #[instrument(skip(self, body), fields(channel = %self.channel), err)]
    async fn publish(&self, body: String) -> Result<String, PortError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;

        let _receivers: i64 = conn
            .publish(&self.channel, body)
            .await
            .map_err(|e| PortError::Rejected(format!("PUBLISH failed: {e}")))?;

        Ok(Uuid::now_v7().to_string())
    }
}
