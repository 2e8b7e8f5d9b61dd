//! # Logging Configuration
//!
//! The configuration record decides which categories are persisted and when the
//! cleanup job runs. It lives in the `logging_settings` table under a well-known
//! name, and exactly one row with that name must exist.
//!
//! Reads go through `ExecutionContext::configuration`, which fetches the record
//! on first use and keeps it for the rest of that unit of work.

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::context::ExecutionContext;
use crate::database::queries;
use crate::logging::errors::LoggingError;

/// Name of the settings row used when none is configured
pub const DEFAULT_SETTINGS_NAME: &str = "Default";
/// Cleanup cadence used for new settings rows: daily at 02:00
pub const DEFAULT_CRON_SCHEDULE: &str = "0 0 2 * * ?";

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub error_logging_enabled: bool,
    pub performance_logging_enabled: bool,
    pub cron_schedule: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            error_logging_enabled: false,
            performance_logging_enabled: false,
            cron_schedule: DEFAULT_CRON_SCHEDULE.to_string(),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Fetch the context's settings row, failing unless exactly one row matches
pub async fn fetch_configuration(ctx: &ExecutionContext) -> Result<Configuration, LoggingError> {
    let name = ctx.settings_name();
    let rows = queries::fetch_logging_settings_by_name(ctx.pool(), name).await?;
    ctx.usage().record_query(rows.len() as u64);

    if rows.len() != 1 {
        return Err(LoggingError::ConfigurationMissing {
            name: name.to_string(),
            found: rows.len(),
        });
    }

    let row = &rows[0];
    let configuration = Configuration {
        error_logging_enabled: row.try_get("enable_error_logging")?,
        performance_logging_enabled: row.try_get("enable_performance_logging")?,
        cron_schedule: row.try_get("scheduler_cron_string")?,
    };
    debug!("Loaded logging configuration '{}': {:?}", name, configuration);
    Ok(configuration)
}

/// Create or replace the settings row with the given name
pub async fn save_configuration(
    pool: &SqlitePool,
    name: &str,
    configuration: &Configuration,
) -> Result<(), LoggingError> {
    let updated = queries::update_logging_settings(
        pool,
        name,
        configuration.error_logging_enabled,
        configuration.performance_logging_enabled,
        &configuration.cron_schedule,
    )
    .await?;

    if updated.rows_affected() == 0 {
        queries::insert_logging_settings(
            pool,
            name,
            configuration.error_logging_enabled,
            configuration.performance_logging_enabled,
            &configuration.cron_schedule,
        )
        .await?;
        info!("Created logging configuration '{}'", name);
    } else {
        info!("Updated logging configuration '{}'", name);
    }
    Ok(())
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
