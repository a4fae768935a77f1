//! Audit storage implementations.

use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use super::record::AuditRecord;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit storage error: {0}")]
    Storage(String),

    #[error("invalid audit table name: {0}")]
    InvalidTable(String),
}

/// Durable audit store abstraction (append-only).
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError>;
}

/// In-memory append-only audit store.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.records
            .write()
            .map_err(|_| AuditError::Storage("lock poisoned".into()))?
            .push(record);
        Ok(())
    }
}
