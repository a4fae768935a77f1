//! Processor registry: task type name → processor descriptor.
//!
//! Built once at startup and shared by reference afterwards. There is no
//! process-wide registration map; whoever needs lookups holds the registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::ConfigurationError;
use crate::processor::ProcessorDescriptor;
use crate::schema::SchemaValidator;

#[derive(Debug, Default)]
pub struct ProcessorRegistry {
    /// Registration order.
    processors: Vec<Arc<ProcessorDescriptor>>,
    index: HashMap<String, usize>,
}

impl ProcessorRegistry {
    /// Build the registry, rejecting empty or duplicate type names and any
    /// schema reference the schema validator cannot resolve.
    pub async fn build(
        descriptors: Vec<ProcessorDescriptor>,
        schemas: &dyn SchemaValidator,
    ) -> Result<Self, ConfigurationError> {
        let mut registry = Self::default();

        for descriptor in descriptors {
            let type_name = descriptor.type_name().to_string();
            if type_name.trim().is_empty() {
                return Err(ConfigurationError::EmptyTypeName);
            }
            if registry.index.contains_key(&type_name) {
                return Err(ConfigurationError::DuplicateTypeName(type_name));
            }
            for schema in descriptor.schema_names() {
                if schemas.fetch_model(schema).await.is_none() {
                    return Err(ConfigurationError::UnresolvedSchema {
                        processor: type_name,
                        schema: schema.to_string(),
                    });
                }
            }

            debug!(processor_type = %type_name, "processor registered");
            registry.index.insert(type_name, registry.processors.len());
            registry.processors.push(Arc::new(descriptor));
        }

        Ok(registry)
    }

    pub fn has(&self, task_type: &str) -> bool {
        self.index.contains_key(task_type)
    }

    pub fn get(&self, task_type: &str) -> Option<Arc<ProcessorDescriptor>> {
        self.index
            .get(task_type)
            .map(|&i| Arc::clone(&self.processors[i]))
    }

    /// Registered type names in registration order.
    pub fn list_types(&self) -> Vec<String> {
        self.processors
            .iter()
            .map(|p| p.type_name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, ObjectSchema, SchemaCatalog};

    fn noop(name: &str) -> ProcessorDescriptor {
        ProcessorDescriptor::from_fn(name, |_, _| Ok(()))
    }

    #[tokio::test]
    async fn lists_types_in_registration_order() {
        let registry = ProcessorRegistry::build(
            vec![noop("Zeta"), noop("Alpha"), noop("Mid")],
            &SchemaCatalog::new(),
        )
        .await
        .unwrap();

        assert_eq!(registry.list_types(), vec!["Zeta", "Alpha", "Mid"]);
        assert!(registry.has("Alpha"));
        assert!(!registry.has("alpha"));
        assert_eq!(registry.get("Mid").unwrap().type_name(), "Mid");
        assert!(registry.get("Missing").is_none());
    }

    #[tokio::test]
    async fn rejects_duplicate_type_name() {
        let err = ProcessorRegistry::build(vec![noop("Echo"), noop("Echo")], &SchemaCatalog::new())
            .await
            .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateTypeName("Echo".into()));
    }

    #[tokio::test]
    async fn rejects_empty_type_name() {
        let err = ProcessorRegistry::build(vec![noop("  ")], &SchemaCatalog::new())
            .await
            .unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyTypeName);
    }

    #[tokio::test]
    async fn rejects_unresolved_schema() {
        let catalog = SchemaCatalog::new()
            .with_schema("Known", ObjectSchema::new().required("a", FieldKind::Any));

        let ok = ProcessorRegistry::build(
            vec![noop("A").with_data_schema("Known")],
            &catalog,
        )
        .await;
        assert!(ok.is_ok());

        let err = ProcessorRegistry::build(
            vec![noop("B").with_data_schema("Known").with_meta_data_schema("Unknown")],
            &catalog,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnresolvedSchema {
                processor: "B".into(),
                schema: "Unknown".into()
            }
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: the build succeeds exactly when type names are pairwise distinct.
            #[test]
            fn build_is_injective_on_type_name(names in prop::collection::vec("[A-C][a-c]{0,1}", 1..8)) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let descriptors = names.iter().map(|n| noop(n)).collect();
                let result = rt.block_on(ProcessorRegistry::build(descriptors, &SchemaCatalog::new()));

                let mut distinct = names.clone();
                distinct.sort();
                distinct.dedup();

                if distinct.len() == names.len() {
                    let registry = result.unwrap();
                    prop_assert_eq!(registry.list_types(), names);
                } else {
                    prop_assert!(matches!(result, Err(ConfigurationError::DuplicateTypeName(_))));
                }
            }
        }
    }
}
