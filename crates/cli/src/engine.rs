use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use taskrail_core::{
    DispatchManager, EntryValidator, ProcessorDescriptor, ProcessorRegistry, SchemaCatalog,
};
use taskrail_events::{LifecycleListener, ListenerSet};
use taskrail_infra::{
    DispatchConfig, ExecutionDispatcher, audit_listeners, build_transport, builtin_processors,
    builtin_schemas,
};

/// A fully wired dispatch stack.
pub struct Engine {
    pub manager: DispatchManager,
    pub dispatcher: Arc<ExecutionDispatcher>,
}

impl Engine {
    /// Built-in processors, plus Postgres sinks when configured.
    pub async fn from_config(config: &DispatchConfig) -> anyhow::Result<Self> {
        let sinks = audit_listeners(config)
            .await
            .context("setting up audit sinks")?;
        Self::build(config, builtin_processors(), builtin_schemas(), sinks).await
    }

    pub async fn build(
        config: &DispatchConfig,
        processors: Vec<ProcessorDescriptor>,
        schemas: SchemaCatalog,
        listeners: Vec<Arc<dyn LifecycleListener>>,
    ) -> anyhow::Result<Self> {
        let schemas = Arc::new(schemas);
        let registry = ProcessorRegistry::build(processors, &*schemas)
            .await
            .context("registering processors")?;
        info!(processors = ?registry.list_types(), "registry ready");

        let validator = Arc::new(EntryValidator::new(Arc::new(registry), schemas));
        let dispatcher = Arc::new(ExecutionDispatcher::new(
            validator.clone(),
            ListenerSet::new(listeners),
        ));
        let transport =
            build_transport(config, dispatcher.clone()).context("selecting transport")?;

        Ok(Self {
            manager: DispatchManager::new(transport, validator),
            dispatcher,
        })
    }
}
