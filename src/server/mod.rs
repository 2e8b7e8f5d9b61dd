//! Long-running service mode for logwarden.
//!
//! The only background work is the log cleanup scheduler. `start_cleanup_scheduler`
//! runs it in the foreground until SIGINT or SIGTERM arrives, then returns once
//! the scheduler has stopped.
//!
//! # Usage
//!
//! ```rust,no_run
//! # async fn run(pool: sqlx::SqlitePool, config: logwarden::env::AppConfig) {
//! logwarden::server::start_cleanup_scheduler(pool, config).await.ok();
//! # }
//! ```

pub mod shutdown;

use self::shutdown::ShutdownCoordinator;
use crate::cleanup::LogCleanupBatch;
use crate::cleanup::scheduler::CleanupScheduler;
use crate::env::AppConfig;
use crate::logging::errors::LoggingError;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tracing::info;

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Run the cleanup scheduler with signal driven graceful shutdown
pub async fn start_cleanup_scheduler(
    pool: SqlitePool,
    config: AppConfig,
) -> Result<(), LoggingError> {
    let shutdown_coordinator = Arc::new(ShutdownCoordinator::new());

    let signal_coordinator = shutdown_coordinator.clone();
    let signal_handle = tokio::spawn(async move {
        signal_coordinator.wait_for_shutdown_signal().await;
    });

    let result = run_scheduler(pool, &config, shutdown_coordinator).await;

    signal_handle.abort();
    info!("logwarden scheduler shutdown complete");
    result
}

/// Run the cleanup scheduler until `shutdown` is initiated
pub async fn run_scheduler(
    pool: SqlitePool,
    config: &AppConfig,
    shutdown: Arc<ShutdownCoordinator>,
) -> Result<(), LoggingError> {
    let scheduler = CleanupScheduler::new(pool, LogCleanupBatch::new(config.cleanup_batch_size))
        .with_settings_name(config.settings_name.clone());

    info!(
        "Cleanup scheduler using settings '{}' with batch size {}",
        config.settings_name, config.cleanup_batch_size
    );
    scheduler.run_with_shutdown(shutdown).await
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
