//! `taskrail-core`: task entries, processors, validation and submission.
//!
//! This crate contains the transport-agnostic pieces of the dispatch engine.
//! Execution, concrete transports and audit sinks live in `taskrail-infra`.

pub mod entry;
pub mod error;
pub mod id;
pub mod manager;
pub mod processor;
pub mod registry;
pub mod schema;
pub mod transport;
pub mod validator;

pub use entry::TaskEntry;
pub use error::{ConfigurationError, ValidationError};
pub use id::CorrelationId;
pub use manager::{BatchSlot, DispatchHandle, DispatchManager};
pub use processor::{FnHandler, ProcessorDescriptor, Rule, TaskHandler};
pub use registry::ProcessorRegistry;
pub use schema::{FieldKind, FieldRule, ObjectSchema, SchemaCatalog, SchemaValidator};
pub use transport::{TaskTransport, TransportError};
pub use validator::EntryValidator;
