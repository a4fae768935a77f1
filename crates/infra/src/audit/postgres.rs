//! Postgres-backed audit store.
//!
//! One table per sink; both share this schema:
//!
//! ```sql
//! CREATE TABLE <table> (
//!     id              UUID PRIMARY KEY,
//!     recorded_at     TIMESTAMPTZ NOT NULL,
//!     environment     TEXT NOT NULL,
//!     event_type      TEXT NOT NULL,
//!     correlation_id  UUID NOT NULL,
//!     processor_type  TEXT NOT NULL,
//!     payload         JSONB NOT NULL,
//!     trace_id        TEXT
//! );
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use super::record::AuditRecord;
use super::store::{AuditError, AuditStore};

pub struct PostgresAuditStore {
    pool: PgPool,
    table: String,
    insert_sql: String,
}

impl PostgresAuditStore {
    /// The table name is interpolated into SQL, so only
    /// `[A-Za-z_][A-Za-z0-9_]*` is accepted.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self, AuditError> {
        let table = table.into();
        if !is_identifier(&table) {
            return Err(AuditError::InvalidTable(table));
        }
        let insert_sql = format!(
            "INSERT INTO {table} \
             (id, recorded_at, environment, event_type, correlation_id, processor_type, payload, trace_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        );
        Ok(Self {
            pool,
            table,
            insert_sql,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the table if it does not exist yet.
    pub async fn ensure_table(&self) -> Result<(), AuditError> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                recorded_at TIMESTAMPTZ NOT NULL,
                environment TEXT NOT NULL,
                event_type TEXT NOT NULL,
                correlation_id UUID NOT NULL,
                processor_type TEXT NOT NULL,
                payload JSONB NOT NULL,
                trace_id TEXT
            )",
            self.table
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AuditStore for PostgresAuditStore {
    #[instrument(
        skip(self, record),
        fields(table = %self.table, correlation_id = %record.correlation_id),
        err
    )]
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        sqlx::query(&self.insert_sql)
            .bind(record.id)
            .bind(record.recorded_at)
            .bind(record.environment)
            .bind(record.event_type)
            .bind(*record.correlation_id.as_uuid())
            .bind(record.processor_type)
            .bind(record.payload)
            .bind(record.trace_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
