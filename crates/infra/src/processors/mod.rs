//! Processors shipped with the engine.

pub mod chain;
pub mod echo;

pub use chain::{CHAIN, CHAIN_SCHEMA, ChainRequest, ChainStep, chain_processor, chain_schema};
pub use echo::{ECHO, echo_processor};

use taskrail_core::{ProcessorDescriptor, SchemaCatalog};

/// Every built-in processor, ready for [`ProcessorRegistry::build`](taskrail_core::ProcessorRegistry::build).
pub fn builtin_processors() -> Vec<ProcessorDescriptor> {
    vec![echo_processor(), chain_processor()]
}

/// Schemas the built-in processors reference.
pub fn builtin_schemas() -> SchemaCatalog {
    SchemaCatalog::new().with_schema(CHAIN_SCHEMA, chain_schema())
}
