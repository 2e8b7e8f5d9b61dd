//! # Persisted Loggers
//!
//! A persisted logger turns its payload into a `LogRecord` and inserts it into
//! the `log_records` table. The insert happens inline in the caller's task, so a
//! database failure surfaces from `log()` instead of being dropped by a
//! background task.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::database::queries;
use crate::logging::errors::LoggingError;
use crate::logging::logger::{Logger, LoggerKind, StackTrace};

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// A durable log entry as written to `log_records`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub message: String,
    pub stack_trace: String,
    pub do_not_delete: bool,
}

impl LogRecord {
    pub fn new(message: impl Into<String>, stack_trace: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack_trace: stack_trace.into(),
            do_not_delete: false,
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                          Public Traits                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Implemented by loggers that write a record. Every implementor is a `Logger`
/// whose `log()` maps itself with `to_record` and inserts the result.
pub trait PersistedLogger: Send + Sync {
    fn record_kind(&self) -> LoggerKind;

    fn trace_slot(&self) -> &StackTrace;

    fn trace_slot_mut(&mut self) -> &mut StackTrace;

    fn to_record(&self, ctx: &ExecutionContext) -> Result<LogRecord, LoggingError>;
}

#[async_trait]
impl<T: PersistedLogger> Logger for T {
    fn kind(&self) -> LoggerKind {
        self.record_kind()
    }

    fn stack_trace(&self) -> &StackTrace {
        self.trace_slot()
    }

    fn set_stack_trace(&mut self, trace: &str) -> &mut dyn Logger {
        self.trace_slot_mut().set(trace);
        self
    }

    async fn log(&self, ctx: &ExecutionContext) -> Result<(), LoggingError> {
        let record = self.to_record(ctx)?;
        insert_record(ctx, &record).await
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Insert a record and account for the write on the context
pub async fn insert_record(ctx: &ExecutionContext, record: &LogRecord) -> Result<(), LoggingError> {
    let record_id = Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339();

    let result = queries::insert_log_record(ctx.pool(), &record_id, record, &created_at).await?;
    ctx.usage().record_dml(result.rows_affected());

    debug!(target: "logwarden::persisted", record_id = %record_id, "Stored log record");
    Ok(())
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
