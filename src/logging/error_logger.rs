//! Error logger: persists a captured error's message and stack trace.

use crate::context::ExecutionContext;
use crate::logging::errors::{CapturedError, LoggingError};
use crate::logging::logger::{LoggerKind, StackTrace};
use crate::logging::persisted::{LogRecord, PersistedLogger};

#[derive(Debug, Clone)]
pub struct ErrorLogger {
    error: CapturedError,
    stack_trace: StackTrace,
}

impl ErrorLogger {
    pub fn new(error: Option<CapturedError>) -> Result<Self, LoggingError> {
        let error = error.ok_or(LoggingError::MissingError)?;
        Ok(Self {
            error,
            stack_trace: StackTrace::default(),
        })
    }

    pub fn error(&self) -> &CapturedError {
        &self.error
    }
}

impl PersistedLogger for ErrorLogger {
    fn record_kind(&self) -> LoggerKind {
        LoggerKind::Error
    }

    fn trace_slot(&self) -> &StackTrace {
        &self.stack_trace
    }

    fn trace_slot_mut(&mut self) -> &mut StackTrace {
        &mut self.stack_trace
    }

    /// The error's own trace is kept unless the caller set one explicitly.
    fn to_record(&self, _ctx: &ExecutionContext) -> Result<LogRecord, LoggingError> {
        let stack_trace = match self.stack_trace.explicit() {
            Some(trace) => trace.to_string(),
            None => self.error.stack_trace().to_string(),
        };
        Ok(LogRecord::new(self.error.message(), stack_trace))
    }
}
