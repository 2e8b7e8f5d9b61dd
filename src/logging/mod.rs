//! # Logging Module
//!
//! This module provides the logging facility used by application code. A caller
//! builds a factory for the category it wants to log, asks it for a logger and
//! calls `log`. Depending on the remotely configured settings the logger either
//! persists a record or writes a transient line to the trace sink.
//!
//! ## Features
//!
//! - **Error Logging**: Persist captured errors with their stack trace
//! - **Performance Logging**: Persist a snapshot of resource usage counters
//! - **Debug Fallback**: Emit a leveled trace line when persistence is disabled
//! - **Stack Trace Overrides**: Replace the captured call stack with a caller supplied one
//!
//! ## Usage
//!
//! ```rust,no_run
//! use logwarden::context::ExecutionContext;
//! use logwarden::logging::errors::CapturedError;
//! use logwarden::logging::factory::{ErrorLoggerFactory, LoggerFactory};
//!
//! # async fn example(pool: sqlx::SqlitePool) -> Result<(), logwarden::logging::errors::LoggingError> {
//! let ctx = ExecutionContext::new(pool);
//! let factory = ErrorLoggerFactory::new(CapturedError::new("boom", "at main"));
//! factory.get_logger(&ctx).await?.log(&ctx).await?;
//! # Ok(())
//! # }
//! ```

pub mod debug;
pub mod error_logger;
pub mod errors;
pub mod factory;
pub mod logger;
pub mod performance;
pub mod persisted;
pub mod sink;

use std::fmt;
use std::str::FromStr;

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Severity of a transient trace line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("Unknown logging level '{}'", other)),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
