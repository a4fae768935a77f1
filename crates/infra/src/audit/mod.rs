//! Durable audit trail of lifecycle events.
//!
//! Two sinks subscribe to the dispatcher:
//! - [`AuditTableSink`]: one record per event, stamped with the environment
//! - [`LogTableSink`]: same, plus the request-scoped trace id
//!
//! Both write append-only [`AuditRecord`]s to an [`AuditStore`]. Store
//! failures are logged and swallowed; auditing never fails a task.

pub mod postgres;
pub mod record;
pub mod sinks;
pub mod store;

pub use postgres::PostgresAuditStore;
pub use record::AuditRecord;
pub use sinks::{AuditTableSink, LogTableSink};
pub use store::{AuditError, AuditStore, InMemoryAuditStore};
