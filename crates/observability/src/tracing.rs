//! Process-wide subscriber setup.
//!
//! JSON lines on stdout. The filter comes from `RUST_LOG`, falling back to
//! a caller-supplied directive. Spans are flattened into each line so the
//! dispatcher's `correlation_id` and `processor_type` fields travel with
//! every log emitted under them.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the subscriber with the `info` fallback.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_default(DEFAULT_DIRECTIVE);
}

/// Install the subscriber, using `directive` when `RUST_LOG` is unset or
/// unparsable.
pub fn init_with_default(directive: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(directive))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_current_span(true)
        .with_span_list(false)
        .with_target(true)
        .try_init();
}

fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_with_default("debug");
        init();
    }

    #[test]
    fn bad_fallback_directive_degrades_to_info() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(env_filter("[[[").to_string(), "info");
        }
    }
}
