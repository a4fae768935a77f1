//! Entry validation and construction.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::processor::{ProcessorDescriptor, Rule};
use crate::registry::ProcessorRegistry;
use crate::schema::SchemaValidator;
use crate::{TaskEntry, ValidationError};

/// Validates entries against their processor's rules and builds new entries.
#[derive(Clone)]
pub struct EntryValidator {
    registry: Arc<ProcessorRegistry>,
    schemas: Arc<dyn SchemaValidator>,
}

impl EntryValidator {
    pub fn new(registry: Arc<ProcessorRegistry>, schemas: Arc<dyn SchemaValidator>) -> Self {
        Self { registry, schemas }
    }

    pub fn registry(&self) -> &Arc<ProcessorRegistry> {
        &self.registry
    }

    /// Violations for `entry`; empty means valid.
    ///
    /// An unregistered type is itself a violation.
    pub async fn validate(&self, entry: &TaskEntry) -> Vec<String> {
        match self.registry.get(entry.task_type()) {
            Some(processor) => {
                self.validate_payload(&processor, entry.data(), entry.metadata())
                    .await
            }
            None => vec![format!(
                "no processor registered for type {}",
                entry.task_type()
            )],
        }
    }

    /// Violations of `data` and `metadata` against an already resolved
    /// processor. Data violations come first; both halves always run.
    pub async fn validate_payload(
        &self,
        processor: &ProcessorDescriptor,
        data: &JsonValue,
        metadata: &JsonValue,
    ) -> Vec<String> {
        let mut violations = self
            .check(processor.data_rule(), processor.data_schema(), data)
            .await;
        violations.extend(
            self.check(processor.meta_data_rule(), processor.meta_data_schema(), metadata)
                .await,
        );
        violations
    }

    pub async fn validate_and_raise(&self, entry: &TaskEntry) -> Result<(), ValidationError> {
        let violations = self.validate(entry).await;
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// Build a validated entry.
    ///
    /// On violation, returns `Ok(None)` when `none_on_invalid` is set and
    /// raises otherwise.
    pub async fn create(
        &self,
        task_type: impl Into<String>,
        data: JsonValue,
        metadata: JsonValue,
        none_on_invalid: bool,
    ) -> Result<Option<TaskEntry>, ValidationError> {
        let entry = TaskEntry::new(task_type, data, metadata);
        match self.validate_and_raise(&entry).await {
            Ok(()) => Ok(Some(entry)),
            Err(_) if none_on_invalid => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create_strict(
        &self,
        task_type: impl Into<String>,
        data: JsonValue,
        metadata: JsonValue,
    ) -> Result<TaskEntry, ValidationError> {
        let entry = TaskEntry::new(task_type, data, metadata);
        self.validate_and_raise(&entry).await?;
        Ok(entry)
    }

    async fn check(&self, rule: Option<&Rule>, schema: Option<&str>, value: &JsonValue) -> Vec<String> {
        match (rule, schema) {
            (Some(rule), _) => (**rule)(value),
            (None, Some(schema)) => self.schemas.validate(schema, value).await,
            (None, None) => Vec::new(),
        }
    }
}
