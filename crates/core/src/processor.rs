//! Processor descriptors: one handler per task type plus optional rules.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::manager::DispatchHandle;

/// Custom validation rule: returns violations, empty when valid.
pub type Rule = Arc<dyn Fn(&JsonValue) -> Vec<String> + Send + Sync>;

/// Executes one task type.
///
/// Returning `Err` (or panicking) marks the execution as failed; the error is
/// recorded as a lifecycle event and never reaches the submitter. Handlers
/// may be invoked more than once for the same entry and must be idempotent.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(
        &self,
        data: JsonValue,
        metadata: JsonValue,
        dispatch: DispatchHandle<'_>,
    ) -> anyhow::Result<()>;
}

/// Adapter for plain closures that never submit follow-up entries.
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> TaskHandler for FnHandler<F>
where
    F: Fn(&JsonValue, &JsonValue) -> anyhow::Result<()> + Send + Sync,
{
    async fn handle(
        &self,
        data: JsonValue,
        metadata: JsonValue,
        _dispatch: DispatchHandle<'_>,
    ) -> anyhow::Result<()> {
        (self.0)(&data, &metadata)
    }
}

/// Registration record for a task type.
///
/// Validation precedence, applied separately to data and metadata: a custom
/// rule wins outright; otherwise a declared schema is consulted; otherwise
/// the value is accepted.
#[derive(Clone)]
pub struct ProcessorDescriptor {
    type_name: String,
    data_schema: Option<String>,
    meta_data_schema: Option<String>,
    validate_data: Option<Rule>,
    validate_meta_data: Option<Rule>,
    handler: Arc<dyn TaskHandler>,
}

impl ProcessorDescriptor {
    pub fn new(type_name: impl Into<String>, handler: impl TaskHandler + 'static) -> Self {
        Self::with_handler(type_name, Arc::new(handler))
    }

    pub fn with_handler(type_name: impl Into<String>, handler: Arc<dyn TaskHandler>) -> Self {
        Self {
            type_name: type_name.into(),
            data_schema: None,
            meta_data_schema: None,
            validate_data: None,
            validate_meta_data: None,
            handler,
        }
    }

    pub fn from_fn<F>(type_name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&JsonValue, &JsonValue) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(type_name, FnHandler(f))
    }

    pub fn with_data_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.data_schema = Some(schema_name.into());
        self
    }

    pub fn with_meta_data_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.meta_data_schema = Some(schema_name.into());
        self
    }

    pub fn with_data_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&JsonValue) -> Vec<String> + Send + Sync + 'static,
    {
        self.validate_data = Some(Arc::new(rule));
        self
    }

    pub fn with_meta_data_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&JsonValue) -> Vec<String> + Send + Sync + 'static,
    {
        self.validate_meta_data = Some(Arc::new(rule));
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn data_schema(&self) -> Option<&str> {
        self.data_schema.as_deref()
    }

    pub fn meta_data_schema(&self) -> Option<&str> {
        self.meta_data_schema.as_deref()
    }

    pub fn data_rule(&self) -> Option<&Rule> {
        self.validate_data.as_ref()
    }

    pub fn meta_data_rule(&self) -> Option<&Rule> {
        self.validate_meta_data.as_ref()
    }

    pub fn handler(&self) -> &Arc<dyn TaskHandler> {
        &self.handler
    }

    /// Declared schema names, data first.
    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.data_schema().into_iter().chain(self.meta_data_schema())
    }
}

impl core::fmt::Debug for ProcessorDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProcessorDescriptor")
            .field("type_name", &self.type_name)
            .field("data_schema", &self.data_schema)
            .field("meta_data_schema", &self.meta_data_schema)
            .field("validate_data", &self.validate_data.is_some())
            .field("validate_meta_data", &self.validate_meta_data.is_some())
            .finish_non_exhaustive()
    }
}
