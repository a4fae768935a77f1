//! Runtime configuration.
//!
//! Everything comes from environment variables with local-friendly
//! defaults. The transport strategy is resolved once, here, and the rest of
//! the engine only ever sees a `dyn TaskTransport`.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::PgPool;
use thiserror::Error;
use tracing::info;

use taskrail_core::TaskTransport;
use taskrail_events::LifecycleListener;

use crate::audit::{AuditError, AuditTableSink, LogTableSink, PostgresAuditStore};
use crate::dispatcher::ExecutionDispatcher;
use crate::transport::{LocalTransport, PortError};

const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
const DEFAULT_QUEUE_PREFIX: &str = "taskrail:queue";
const DEFAULT_NOTIFY_CHANNEL: &str = "taskrail:notify";
const DEFAULT_ENVIRONMENT: &str = "dev";
const DEFAULT_AUDIT_TABLE: &str = "task_audit";
const DEFAULT_LOG_TABLE: &str = "task_log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TASKRAIL_MODE {0:?} (expected \"local\" or \"remote\")")]
    InvalidMode(String),

    #[error("remote mode requires the `redis` feature")]
    RemoteUnavailable,

    #[error("transport setup failed: {0}")]
    Transport(#[from] PortError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("audit setup failed: {0}")]
    Audit(#[from] AuditError),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DispatchMode {
    #[default]
    Local,
    Remote,
}

impl FromStr for DispatchMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub mode: DispatchMode,
    pub redis_url: String,
    pub queue_prefix: String,
    pub notify_channel: String,
    pub environment: String,
    pub database_url: Option<String>,
    pub audit_table: String,
    pub log_table: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Local,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            queue_prefix: DEFAULT_QUEUE_PREFIX.to_string(),
            notify_channel: DEFAULT_NOTIFY_CHANNEL.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            database_url: None,
            audit_table: DEFAULT_AUDIT_TABLE.to_string(),
            log_table: DEFAULT_LOG_TABLE.to_string(),
        }
    }
}

impl DispatchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let mode = match get("TASKRAIL_MODE") {
            Some(raw) => raw.parse()?,
            None => DispatchMode::Local,
        };

        Ok(Self {
            mode,
            redis_url: or("REDIS_URL", DEFAULT_REDIS_URL),
            queue_prefix: or("TASKRAIL_QUEUE_PREFIX", DEFAULT_QUEUE_PREFIX),
            notify_channel: or("TASKRAIL_NOTIFY_CHANNEL", DEFAULT_NOTIFY_CHANNEL),
            environment: or("TASKRAIL_ENVIRONMENT", DEFAULT_ENVIRONMENT),
            database_url: get("DATABASE_URL"),
            audit_table: or("TASKRAIL_AUDIT_TABLE", DEFAULT_AUDIT_TABLE),
            log_table: or("TASKRAIL_LOG_TABLE", DEFAULT_LOG_TABLE),
        })
    }
}

/// Pick the transport strategy for this process.
///
/// `dispatcher` is only used in local mode, where submission runs it inline.
pub fn build_transport(
    config: &DispatchConfig,
    dispatcher: Arc<ExecutionDispatcher>,
) -> Result<Arc<dyn TaskTransport>, ConfigError> {
    match config.mode {
        DispatchMode::Local => {
            info!(mode = "local", "transport selected");
            Ok(Arc::new(LocalTransport::new(dispatcher)))
        }
        DispatchMode::Remote => remote_transport(config),
    }
}

#[cfg(feature = "redis")]
fn remote_transport(config: &DispatchConfig) -> Result<Arc<dyn TaskTransport>, ConfigError> {
    use crate::transport::{RedisNotifier, RedisQueue, RemoteTransport};

    let queue = RedisQueue::new(&config.redis_url, config.queue_prefix.clone())?;
    let notifier = RedisNotifier::new(&config.redis_url, config.notify_channel.clone())?;
    info!(
        mode = "remote",
        queue_prefix = %config.queue_prefix,
        notify_channel = %config.notify_channel,
        "transport selected"
    );
    Ok(Arc::new(RemoteTransport::new(queue, notifier)))
}

#[cfg(not(feature = "redis"))]
fn remote_transport(_config: &DispatchConfig) -> Result<Arc<dyn TaskTransport>, ConfigError> {
    Err(ConfigError::RemoteUnavailable)
}

/// Audit and log sinks backed by Postgres, or none when `DATABASE_URL` is
/// unset. Tables are created if missing.
pub async fn audit_listeners(
    config: &DispatchConfig,
) -> Result<Vec<Arc<dyn LifecycleListener>>, ConfigError> {
    let Some(url) = config.database_url.as_deref() else {
        info!("DATABASE_URL not set; audit sinks disabled");
        return Ok(Vec::new());
    };

    let pool = PgPool::connect(url).await?;
    let audit = PostgresAuditStore::new(pool.clone(), config.audit_table.clone())?;
    let log = PostgresAuditStore::new(pool, config.log_table.clone())?;
    audit.ensure_table().await?;
    log.ensure_table().await?;

    info!(audit_table = %config.audit_table, log_table = %config.log_table, "audit sinks enabled");
    let audit_sink: Arc<dyn LifecycleListener> =
        Arc::new(AuditTableSink::new(Arc::new(audit), config.environment.clone()));
    let log_sink: Arc<dyn LifecycleListener> =
        Arc::new(LogTableSink::new(Arc::new(log), config.environment.clone()));
    Ok(vec![audit_sink, log_sink])
}
