//! Runtime layer: dispatcher, transports, consumer, audit sinks, config.

pub mod audit;
pub mod config;
pub mod consumer;
pub mod dispatcher;
pub mod processors;
pub mod transport;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, DispatchConfig, DispatchMode, audit_listeners, build_transport};
pub use consumer::{ConsumerError, NotificationOutcome, RemoteConsumer};
pub use dispatcher::{DispatchOutcome, ExecutionDispatcher, ExecutionState};
pub use processors::{builtin_processors, builtin_schemas};
pub use transport::{LOCAL_START_SENTINEL, LocalTransport, RemoteTransport};
