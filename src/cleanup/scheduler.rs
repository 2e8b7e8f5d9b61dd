//! # Cleanup Scheduler
//!
//! Triggers the log cleanup batch on the cadence stored in the logging
//! configuration. Cron strings use the Quartz layout with a leading seconds
//! field and an optional trailing year, e.g. `0 0 2 * * ?` for 02:00 daily.
//! `?` ("no specific value") is read as `*`.
//!
//! The schedule is read once when the scheduler starts. Each firing runs the
//! batch in a fresh execution context, so a failed run does not affect the next.

use chrono::{DateTime, Utc};
use cron::Schedule;
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cleanup::{CleanupSummary, LogCleanupBatch};
use crate::config::DEFAULT_SETTINGS_NAME;
use crate::context::ExecutionContext;
use crate::logging::errors::LoggingError;
use crate::server::shutdown::{ShutdownAwareTask, ShutdownCoordinator};

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

pub struct CleanupScheduler {
    pool: SqlitePool,
    batch: LogCleanupBatch,
    settings_name: String,
}

impl CleanupScheduler {
    pub fn new(pool: SqlitePool, batch: LogCleanupBatch) -> Self {
        Self {
            pool,
            batch,
            settings_name: DEFAULT_SETTINGS_NAME.to_string(),
        }
    }

    pub fn with_settings_name(mut self, name: impl Into<String>) -> Self {
        self.settings_name = name.into();
        self
    }

    fn new_context(&self) -> ExecutionContext {
        ExecutionContext::new(self.pool.clone()).with_settings_name(self.settings_name.clone())
    }

    /// Read and parse the configured cron schedule
    pub async fn load_schedule(&self) -> Result<Schedule, LoggingError> {
        let ctx = self.new_context();
        let configuration = ctx.configuration().await?;
        parse_cron_schedule(&configuration.cron_schedule)
    }

    /// Run the batch once, as a firing of the schedule would
    pub async fn trigger(&self) -> Result<CleanupSummary, LoggingError> {
        let ctx = self.new_context();
        self.batch.run(&ctx).await
    }

    /// Fire the batch at every scheduled time until shutdown is requested.
    /// Fails only if the schedule cannot be loaded.
    pub async fn run_with_shutdown(
        &self,
        shutdown: Arc<ShutdownCoordinator>,
    ) -> Result<(), LoggingError> {
        let schedule = self.load_schedule().await?;
        let mut shutdown_task = ShutdownAwareTask::new(&shutdown);

        info!("Starting log cleanup scheduler");
        loop {
            let Some(next_run) = next_fire_time(&schedule, Utc::now()) else {
                warn!("Cleanup schedule has no upcoming fire times, stopping scheduler");
                return Ok(());
            };
            info!("Next log cleanup scheduled for {}", next_run.to_rfc3339());

            let wait = (next_run - Utc::now()).to_std().unwrap_or_default();
            if shutdown_task.wait_or_shutdown(wait).await {
                info!("Log cleanup scheduler shutting down");
                return Ok(());
            }

            if let Err(e) = self.trigger().await {
                error!("Scheduled log cleanup failed: {}", e);
            }
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Parse a Quartz style cron expression
pub fn parse_cron_schedule(expression: &str) -> Result<Schedule, LoggingError> {
    let normalized = expression.trim().replace('?', "*");
    Schedule::from_str(&normalized).map_err(|e| LoggingError::InvalidSchedule {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// First fire time strictly after `after`
pub fn next_fire_time(schedule: &Schedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&after).next()
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{self, Configuration};
    use crate::database::{DatabaseManager, queries};
    use chrono::TimeZone;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::time::Duration;

    async fn create_test_pool(cron_schedule: &str) -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        let db = DatabaseManager::new(pool.clone());
        db.initialize().await.unwrap();
        db.apply_pending_migrations().await.unwrap();

        let settings = Configuration {
            cron_schedule: cron_schedule.to_string(),
            ..Configuration::default()
        };
        config::save_configuration(&pool, DEFAULT_SETTINGS_NAME, &settings)
            .await
            .unwrap();
        pool
    }

    #[test]
    fn test_parse_quartz_expression() {
        let schedule = parse_cron_schedule("0 0 2 * * ?").unwrap();
        let from = Utc.with_ymd_and_hms(2024, 3, 10, 1, 30, 0).unwrap();
        let next = next_fire_time(&schedule, from).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 10, 2, 0, 0).unwrap());
    }

    #[test]
    fn test_next_fire_time_is_strictly_after() {
        let schedule = parse_cron_schedule("0 0 2 * * ?").unwrap();
        let from = Utc.with_ymd_and_hms(2024, 3, 10, 2, 0, 0).unwrap();
        let next = next_fire_time(&schedule, from).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 11, 2, 0, 0).unwrap());
    }

    #[test]
    fn test_invalid_expression_is_rejected() {
        let result = parse_cron_schedule("every night");
        assert!(matches!(
            result,
            Err(LoggingError::InvalidSchedule { ref expression, .. }) if expression == "every night"
        ));
    }

    #[tokio::test]
    async fn test_load_schedule_reads_configuration() {
        let pool = create_test_pool("0 15 * * * ?").await;
        let scheduler = CleanupScheduler::new(pool, LogCleanupBatch::default());
        let schedule = scheduler.load_schedule().await.unwrap();

        let from = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        assert_eq!(
            next_fire_time(&schedule, from).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 15, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_run_fails_on_invalid_configured_schedule() {
        let pool = create_test_pool("not a schedule").await;
        let scheduler = CleanupScheduler::new(pool, LogCleanupBatch::default());
        let shutdown = Arc::new(ShutdownCoordinator::new());

        let result = scheduler.run_with_shutdown(shutdown).await;
        assert!(matches!(result, Err(LoggingError::InvalidSchedule { .. })));
    }

    #[tokio::test]
    async fn test_trigger_runs_cleanup() {
        let pool = create_test_pool("0 0 2 * * ?").await;
        let ctx = ExecutionContext::new(pool.clone());
        crate::logging::persisted::insert_record(
            &ctx,
            &crate::logging::persisted::LogRecord::new("old", "trace"),
        )
        .await
        .unwrap();

        let scheduler = CleanupScheduler::new(pool.clone(), LogCleanupBatch::default());
        let summary = scheduler.trigger().await.unwrap();
        assert_eq!(summary.deleted, 1);
        assert_eq!(queries::count_log_records(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_scheduler_fires_and_stops_on_shutdown() {
        let pool = create_test_pool("* * * * * ?").await;
        sqlx::query(
            "INSERT INTO log_records (id, message, stack_trace, created_at)
             VALUES ('stale', 'message', 'trace', datetime('now'))",
        )
        .execute(&pool)
        .await
        .unwrap();

        let scheduler = CleanupScheduler::new(pool.clone(), LogCleanupBatch::default());
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let stopper = shutdown.clone();

        let handle = tokio::spawn(async move { scheduler.run_with_shutdown(shutdown).await });

        // every-second schedule: give it time to fire at least once
        tokio::time::sleep(Duration::from_millis(2500)).await;
        stopper.initiate_shutdown();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(queries::count_log_records(&pool).await.unwrap(), 0);
    }
}
