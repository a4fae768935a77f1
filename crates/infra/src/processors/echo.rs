use serde_json::Value as JsonValue;
use tracing::info;

use taskrail_core::ProcessorDescriptor;

pub const ECHO: &str = "Echo";

/// Logs its payload and succeeds. Useful as a smoke test for a deployment.
pub fn echo_processor() -> ProcessorDescriptor {
    ProcessorDescriptor::from_fn(ECHO, |data: &JsonValue, metadata: &JsonValue| {
        info!(data = %data, metadata = %metadata, "echo");
        Ok(())
    })
}
