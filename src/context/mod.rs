//! # Execution Context
//!
//! One unit of work: a request, a CLI invocation or a single cleanup run. The
//! context owns the database pool handle, the trace sink, the resource usage
//! counters and the configuration record, which is fetched on first use and then
//! reused until the context is dropped. A new context always re-reads it.

use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::{self, Configuration, DEFAULT_SETTINGS_NAME};
use crate::logging::errors::LoggingError;
use crate::logging::sink::{TraceSink, TracingSink};
use crate::metrics::UsageCounters;

pub struct ExecutionContext {
    pool: SqlitePool,
    sink: Arc<dyn TraceSink>,
    usage: UsageCounters,
    settings_name: String,
    configuration: OnceCell<Configuration>,
}

impl ExecutionContext {
    /// Create a context that writes trace lines through `tracing`
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            sink: Arc::new(TracingSink),
            usage: UsageCounters::new(),
            settings_name: DEFAULT_SETTINGS_NAME.to_string(),
            configuration: OnceCell::new(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_settings_name(mut self, name: impl Into<String>) -> Self {
        self.settings_name = name.into();
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn sink(&self) -> &dyn TraceSink {
        self.sink.as_ref()
    }

    pub fn usage(&self) -> &UsageCounters {
        &self.usage
    }

    pub fn settings_name(&self) -> &str {
        &self.settings_name
    }

    /// The configuration record, read from the database at most once
    pub async fn configuration(&self) -> Result<&Configuration, LoggingError> {
        self.configuration
            .get_or_try_init(|| config::fetch_configuration(self))
            .await
    }
}
