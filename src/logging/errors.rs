//! # Logging Errors
//!
//! Error taxonomy of the logging facility and the `CapturedError` payload handed
//! to error loggers. Nothing in this crate retries or swallows these errors; they
//! are returned to the caller as-is.

use std::error::Error;
use std::fmt;
use thiserror::Error;

use crate::logging::logger::capture_stack_trace;

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Errors raised by loggers, factories, the configuration accessor and cleanup
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The configuration record is absent or ambiguous
    #[error("logging configuration '{name}' not found exactly once (found {found})")]
    ConfigurationMissing { name: String, found: usize },

    /// A debug logger was built without a severity
    #[error("a logging level is required to build a debug logger")]
    MissingLoggingLevel,

    /// An error logger was built without an error to record
    #[error("an error is required to build an error logger")]
    MissingError,

    /// A migration was unknown, already applied or failed to run
    #[error("migration {version}: {reason}")]
    Migration { version: u32, reason: String },

    #[error("invalid cron schedule '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    #[error("failed to serialize performance snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// An error captured for persistence: its message and formatted stack trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    message: String,
    stack_trace: String,
}

impl CapturedError {
    pub fn new(message: impl Into<String>, stack_trace: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack_trace: stack_trace.into(),
        }
    }

    /// Capture an error value together with the current call stack.
    ///
    /// The message is the error's display text followed by each source in the
    /// chain, separated by `": "`.
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        Self {
            message,
            stack_trace: capture_stack_trace(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack_trace(&self) -> &str {
        &self.stack_trace
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
