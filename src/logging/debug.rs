//! Debug logger: a leveled, ephemeral line written to the trace sink.

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::logging::LogLevel;
use crate::logging::errors::LoggingError;
use crate::logging::logger::{Logger, LoggerKind, StackTrace};

#[derive(Debug, Clone)]
pub struct DebugLogger {
    level: LogLevel,
    message: String,
    stack_trace: StackTrace,
}

impl DebugLogger {
    pub fn new(level: Option<LogLevel>, message: impl Into<String>) -> Result<Self, LoggingError> {
        let level = level.ok_or(LoggingError::MissingLoggingLevel)?;
        Ok(Self {
            level,
            message: message.into(),
            stack_trace: StackTrace::default(),
        })
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[async_trait]
impl Logger for DebugLogger {
    fn kind(&self) -> LoggerKind {
        LoggerKind::Debug(self.level)
    }

    fn stack_trace(&self) -> &StackTrace {
        &self.stack_trace
    }

    fn set_stack_trace(&mut self, trace: &str) -> &mut dyn Logger {
        self.stack_trace.set(trace);
        self
    }

    async fn log(&self, ctx: &ExecutionContext) -> Result<(), LoggingError> {
        let text = format!("{}\nAt: {}", self.message, self.resolve_stack_trace());
        ctx.sink().emit(self.level, &text);
        Ok(())
    }
}
