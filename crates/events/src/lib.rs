//! Lifecycle events, listeners and wire formats.

pub mod in_memory_log;
pub mod lifecycle;
pub mod listener;
pub mod wire;

pub use in_memory_log::InMemoryEventLog;
pub use lifecycle::{LifecycleEvent, LifecycleEventKind};
pub use listener::{LifecycleListener, ListenerSet};
pub use wire::{CodecError, Notification, START_MARKER, decode_entry, encode_entry};
