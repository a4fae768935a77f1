//! Error model for registry construction and entry validation.

use thiserror::Error;

/// Fatal misconfiguration detected while building the processor registry.
///
/// These abort startup; they are never produced while dispatching.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A processor was declared with an empty type name.
    #[error("processor type name must not be empty")]
    EmptyTypeName,

    /// Two processors claim the same type name.
    #[error("duplicate processor type name: {0}")]
    DuplicateTypeName(String),

    /// A processor references a schema the schema validator cannot resolve.
    #[error("processor {processor} references unknown schema {schema}")]
    UnresolvedSchema { processor: String, schema: String },
}

/// An entry failed custom or schema validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("validation failed: {}", violations.join("; "))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

impl ValidationError {
    pub fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }
}
