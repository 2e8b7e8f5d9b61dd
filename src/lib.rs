//! # logwarden
//!
//! In-process logging facility. Application code asks a factory for a logger
//! and calls `log()`; depending on the logging configuration the entry is either
//! persisted as a log record or written as a transient trace line. Persisted
//! records are purged by a cleanup batch that runs on a cron schedule.
//!
//! ```rust,no_run
//! use logwarden::context::ExecutionContext;
//! use logwarden::logging::factory::{ErrorLoggerFactory, LoggerFactory};
//!
//! # async fn run(pool: sqlx::SqlitePool, err: std::io::Error) -> Result<(), logwarden::logging::errors::LoggingError> {
//! let ctx = ExecutionContext::new(pool);
//! let factory = ErrorLoggerFactory::from_error(&err);
//! factory.get_logger(&ctx).await?.log(&ctx).await?;
//! # Ok(())
//! # }
//! ```

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod context;
pub mod database;
pub mod env;
pub mod logging;
pub mod metrics;
pub mod server;

#[cfg(test)]
mod tests;
