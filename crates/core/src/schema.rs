//! Shared schema validation capability.
//!
//! Processors may name a schema for their data and/or metadata instead of
//! supplying a custom rule. The registry resolves every declared schema name
//! once at build time via [`SchemaValidator::fetch_model`]; validation calls
//! go through [`SchemaValidator::validate`].
//!
//! [`SchemaCatalog`] is the in-process implementation: named object schemas
//! made of typed field rules.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Schema validator collaborator.
#[async_trait]
pub trait SchemaValidator: Send + Sync {
    /// Validate `value` against the named schema. Empty means valid.
    async fn validate(&self, schema_name: &str, value: &JsonValue) -> Vec<String>;

    /// Resolve a schema by name (`None` if unknown).
    async fn fetch_model(&self, schema_name: &str) -> Option<ObjectSchema>;
}

/// JSON type a field is expected to hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Any,
}

impl FieldKind {
    fn matches(self, value: &JsonValue) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
            FieldKind::Any => true,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Object => "an object",
            FieldKind::Array => "an array",
            FieldKind::Any => "any value",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

/// A flat object schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSchema {
    fields: Vec<FieldRule>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    /// Check `value`, returning one violation per failing field.
    ///
    /// `null` on an optional field counts as absent.
    pub fn check(&self, value: &JsonValue) -> Vec<String> {
        let Some(object) = value.as_object() else {
            return vec!["expected an object".to_string()];
        };

        let mut violations = Vec::new();
        for rule in &self.fields {
            match object.get(&rule.name) {
                None | Some(JsonValue::Null) if rule.required => {
                    violations.push(format!("{} required", rule.name));
                }
                None | Some(JsonValue::Null) => {}
                Some(v) if !rule.kind.matches(v) => {
                    violations.push(format!("{} must be {}", rule.name, rule.kind.describe()));
                }
                Some(_) => {}
            }
        }
        violations
    }
}

/// In-memory schema validator keyed by schema name.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: HashMap<String, ObjectSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a named schema.
    pub fn with_schema(mut self, name: impl Into<String>, schema: ObjectSchema) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, schema: ObjectSchema) {
        self.schemas.insert(name.into(), schema);
    }
}

#[async_trait]
impl SchemaValidator for SchemaCatalog {
    async fn validate(&self, schema_name: &str, value: &JsonValue) -> Vec<String> {
        match self.schemas.get(schema_name) {
            Some(schema) => schema.check(value),
            None => vec![format!("unknown schema {schema_name}")],
        }
    }

    async fn fetch_model(&self, schema_name: &str) -> Option<ObjectSchema> {
        self.schemas.get(schema_name).cloned()
    }
}
