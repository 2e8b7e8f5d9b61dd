//! # Logger Factories
//!
//! A factory holds the payload to log and decides, when asked for a logger,
//! whether persisted logging is enabled for its category. Enabled categories get
//! a persisted logger, the others get a debug logger at a fixed level.

use async_trait::async_trait;
use tracing::debug;

use crate::context::ExecutionContext;
use crate::logging::LogLevel;
use crate::logging::debug::DebugLogger;
use crate::logging::error_logger::ErrorLogger;
use crate::logging::errors::{CapturedError, LoggingError};
use crate::logging::logger::Logger;
use crate::logging::performance::PerformanceLogger;

///////////////////////////////////////////////////////////////////////////////
//****                          Public Traits                            ****//
///////////////////////////////////////////////////////////////////////////////

#[async_trait]
pub trait LoggerFactory: Send + Sync {
    async fn is_enabled(&self, ctx: &ExecutionContext) -> Result<bool, LoggingError>;

    fn persisted_logger(&self) -> Result<Box<dyn Logger>, LoggingError>;

    fn debug_logger(&self) -> Result<Box<dyn Logger>, LoggingError>;

    /// Build the logger for the current configuration. The logger is returned
    /// unused; calling `log()` is up to the caller.
    async fn get_logger(&self, ctx: &ExecutionContext) -> Result<Box<dyn Logger>, LoggingError> {
        if self.is_enabled(ctx).await? {
            self.persisted_logger()
        } else {
            self.debug_logger()
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Factory for the error category, falls back to ERROR level trace lines
#[derive(Debug, Clone)]
pub struct ErrorLoggerFactory {
    error: CapturedError,
}

impl ErrorLoggerFactory {
    pub fn new(error: CapturedError) -> Self {
        Self { error }
    }

    /// Capture an error value and the current call stack
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        Self::new(CapturedError::from_error(error))
    }
}

#[async_trait]
impl LoggerFactory for ErrorLoggerFactory {
    async fn is_enabled(&self, ctx: &ExecutionContext) -> Result<bool, LoggingError> {
        let enabled = ctx.configuration().await?.error_logging_enabled;
        debug!("Error logging enabled: {}", enabled);
        Ok(enabled)
    }

    fn persisted_logger(&self) -> Result<Box<dyn Logger>, LoggingError> {
        Ok(Box::new(ErrorLogger::new(Some(self.error.clone()))?))
    }

    fn debug_logger(&self) -> Result<Box<dyn Logger>, LoggingError> {
        Ok(Box::new(DebugLogger::new(
            Some(LogLevel::Error),
            self.error.message(),
        )?))
    }
}

/// Factory for the performance category, falls back to INFO level trace lines
#[derive(Debug, Clone, Default)]
pub struct PerformanceLoggerFactory {
    raw_duration: Option<i64>,
}

impl PerformanceLoggerFactory {
    pub fn new(raw_duration: Option<i64>) -> Self {
        Self { raw_duration }
    }

    fn duration_text(&self) -> String {
        match self.raw_duration {
            Some(duration) => duration.to_string(),
            None => "null".to_string(),
        }
    }
}

#[async_trait]
impl LoggerFactory for PerformanceLoggerFactory {
    async fn is_enabled(&self, ctx: &ExecutionContext) -> Result<bool, LoggingError> {
        let enabled = ctx.configuration().await?.performance_logging_enabled;
        debug!("Performance logging enabled: {}", enabled);
        Ok(enabled)
    }

    fn persisted_logger(&self) -> Result<Box<dyn Logger>, LoggingError> {
        Ok(Box::new(PerformanceLogger::new(self.raw_duration)))
    }

    fn debug_logger(&self) -> Result<Box<dyn Logger>, LoggingError> {
        Ok(Box::new(DebugLogger::new(
            Some(LogLevel::Info),
            self.duration_text(),
        )?))
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{self, Configuration};
    use crate::database::DatabaseManager;
    use crate::logging::logger::LoggerKind;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool(error_logging: bool, performance_logging: bool) -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        let db = DatabaseManager::new(pool.clone());
        db.initialize().await.unwrap();
        db.apply_pending_migrations().await.unwrap();

        let settings = Configuration {
            error_logging_enabled: error_logging,
            performance_logging_enabled: performance_logging,
            cron_schedule: "0 0 2 * * ?".to_string(),
        };
        config::save_configuration(&pool, config::DEFAULT_SETTINGS_NAME, &settings)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_error_factory_follows_flag() {
        let factory = ErrorLoggerFactory::new(CapturedError::new("boom", "trace"));

        let enabled = ExecutionContext::new(create_test_pool(true, false).await);
        let logger = factory.get_logger(&enabled).await.unwrap();
        assert_eq!(logger.kind(), LoggerKind::Error);

        let disabled = ExecutionContext::new(create_test_pool(false, true).await);
        let logger = factory.get_logger(&disabled).await.unwrap();
        assert_eq!(logger.kind(), LoggerKind::Debug(LogLevel::Error));
    }

    #[tokio::test]
    async fn test_performance_factory_follows_flag() {
        let factory = PerformanceLoggerFactory::new(Some(42));

        let enabled = ExecutionContext::new(create_test_pool(false, true).await);
        let logger = factory.get_logger(&enabled).await.unwrap();
        assert_eq!(logger.kind(), LoggerKind::Performance);

        let disabled = ExecutionContext::new(create_test_pool(true, false).await);
        let logger = factory.get_logger(&disabled).await.unwrap();
        assert_eq!(logger.kind(), LoggerKind::Debug(LogLevel::Info));
    }

    #[tokio::test]
    async fn test_get_logger_does_not_log() {
        let pool = create_test_pool(true, true).await;
        let ctx = ExecutionContext::new(pool.clone());

        ErrorLoggerFactory::new(CapturedError::new("boom", "trace"))
            .get_logger(&ctx)
            .await
            .unwrap();

        let count = crate::database::queries::count_log_records(&pool).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_missing_configuration_fails_get_logger() {
        let pool = create_test_pool(true, true).await;
        let ctx = ExecutionContext::new(pool).with_settings_name("Unknown");

        let result = PerformanceLoggerFactory::new(None).get_logger(&ctx).await;
        assert!(matches!(
            result,
            Err(LoggingError::ConfigurationMissing { found: 0, .. })
        ));
    }

    #[test]
    fn test_duration_text() {
        assert_eq!(PerformanceLoggerFactory::new(Some(-7)).duration_text(), "-7");
        assert_eq!(PerformanceLoggerFactory::new(None).duration_text(), "null");
    }
}
