//! Performance logger: persists a snapshot of the execution's resource usage.

use crate::context::ExecutionContext;
use crate::logging::errors::LoggingError;
use crate::logging::logger::{Logger, LoggerKind, StackTrace};
use crate::logging::persisted::{LogRecord, PersistedLogger};

#[derive(Debug, Clone, Default)]
pub struct PerformanceLogger {
    raw_duration: Option<i64>,
    stack_trace: StackTrace,
}

impl PerformanceLogger {
    /// `raw_duration` is opaque to this crate; it is echoed into the record as-is.
    pub fn new(raw_duration: Option<i64>) -> Self {
        Self {
            raw_duration,
            stack_trace: StackTrace::default(),
        }
    }

    pub fn raw_duration(&self) -> Option<i64> {
        self.raw_duration
    }
}

impl PersistedLogger for PerformanceLogger {
    fn record_kind(&self) -> LoggerKind {
        LoggerKind::Performance
    }

    fn trace_slot(&self) -> &StackTrace {
        &self.stack_trace
    }

    fn trace_slot_mut(&mut self) -> &mut StackTrace {
        &mut self.stack_trace
    }

    fn to_record(&self, ctx: &ExecutionContext) -> Result<LogRecord, LoggingError> {
        let snapshot = ctx.usage().snapshot(self.raw_duration);
        let message = serde_json::to_string(&snapshot)?;
        Ok(LogRecord::new(message, self.resolve_stack_trace()))
    }
}
