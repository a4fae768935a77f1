//! Transport strategies.
//!
//! Both implement [`TaskTransport`](taskrail_core::TaskTransport):
//! - [`LocalTransport`]: runs the dispatcher in the caller's call stack.
//! - [`RemoteTransport`]: durable queue grouped by task type plus a
//!   notification channel, over the [`ports`] traits.

pub mod in_memory;
pub mod local;
pub mod ports;
pub mod remote;

#[cfg(feature = "redis")]
pub mod redis;

pub use in_memory::{InMemoryNotifier, InMemoryQueue};
pub use local::{LOCAL_START_SENTINEL, LocalTransport};
pub use ports::{NotificationTransport, PortError, QueueMessage, QueueTransport};
pub use remote::RemoteTransport;

#[cfg(feature = "redis")]
pub use self::redis::{RedisNotifier, RedisQueue};
