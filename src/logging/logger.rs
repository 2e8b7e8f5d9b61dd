//! The `Logger` capability shared by every logger variant.

use async_trait::async_trait;
use std::backtrace::Backtrace;

use crate::context::ExecutionContext;
use crate::logging::LogLevel;
use crate::logging::errors::LoggingError;

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Which variant a factory handed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerKind {
    /// Transient trace line at the given level
    Debug(LogLevel),
    /// Persisted error record
    Error,
    /// Persisted performance record
    Performance,
}

impl LoggerKind {
    pub fn is_persisted(&self) -> bool {
        !matches!(self, LoggerKind::Debug(_))
    }
}

/// Optional caller supplied stack trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackTrace {
    explicit: Option<String>,
}

impl StackTrace {
    pub fn set(&mut self, trace: &str) {
        self.explicit = Some(trace.to_string());
    }

    pub fn explicit(&self) -> Option<&str> {
        self.explicit.as_deref()
    }

    /// The override if one was set, otherwise the call stack as of now
    pub fn resolve(&self) -> String {
        match &self.explicit {
            Some(trace) => trace.clone(),
            None => capture_stack_trace(),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                          Public Traits                            ****//
///////////////////////////////////////////////////////////////////////////////

#[async_trait]
pub trait Logger: Send + Sync {
    fn kind(&self) -> LoggerKind;

    fn stack_trace(&self) -> &StackTrace;

    /// Store a stack trace to use instead of the captured one. No validation is
    /// applied to the content.
    fn set_stack_trace(&mut self, trace: &str) -> &mut dyn Logger;

    /// Resolved when called, so a capture reflects the frames of `log()` rather
    /// than those of the code that built the logger.
    fn resolve_stack_trace(&self) -> String {
        self.stack_trace().resolve()
    }

    async fn log(&self, ctx: &ExecutionContext) -> Result<(), LoggingError>;
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Capture and format the current call stack
pub fn capture_stack_trace() -> String {
    Backtrace::force_capture().to_string()
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
