//! Logging setup and request-scoped context.

/// Initialize process-wide tracing with the `info` fallback filter.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filters, JSON format).
pub mod tracing;

/// Request-scoped trace id.
pub mod context;

pub use context::{current_trace_id, with_trace_id};
pub use tracing::init_with_default;
