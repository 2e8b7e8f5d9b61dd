//! # CLI Module
//!
//! This module provides the command-line interface for logwarden. It parses the
//! command line and runs each command against the log store.
//!
//! ## Commands
//!
//! ### Configuration
//! - `settings show`: print the logging configuration record
//! - `settings set`: create or update the logging configuration record
//! - `env-check`: report how the environment was validated, or print a `.env` example
//!
//! ### Logging
//! - `log-error`: log an error through the error logger factory
//! - `log-performance`: log a performance snapshot through the performance logger factory
//! - `debug`: write a transient trace line at a chosen level
//!
//! ### Log Records
//! - `records`: list the most recent persisted records
//! - `keep`: set or release the do-not-delete flag of a record
//! - `cleanup`: run the cleanup batch once
//! - `schedule`: run the cleanup scheduler until interrupted, or preview its fire times
//!
//! ### Database
//! - `migrate`: migration status, apply, create templates and view the schema
//!
//! ## Usage Example
//!
//! ```bash
//! # Persist error records from now on
//! logwarden settings set --error-logging true
//!
//! # Log an error; persisted or traced depending on the settings
//! logwarden log-error --message "payment gateway timed out"
//!
//! # Purge every record not flagged do-not-delete
//! logwarden cleanup --batch-size 500
//! ```

use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::{Row, sqlite::SqlitePool};
use tracing::info;

use crate::cleanup::LogCleanupBatch;
use crate::cleanup::scheduler::{next_fire_time, parse_cron_schedule};
use crate::config::{self, Configuration};
use crate::context::ExecutionContext;
use crate::database::{DatabaseManager, MigrationCli, queries};
use crate::env::{self, AppConfig};
use crate::logging::LogLevel;
use crate::logging::debug::DebugLogger;
use crate::logging::errors::{CapturedError, LoggingError};
use crate::logging::factory::{ErrorLoggerFactory, LoggerFactory, PerformanceLoggerFactory};
use crate::logging::logger::{Logger, LoggerKind, capture_stack_trace};

/// Records listed by `records` unless `--limit` is given
const DEFAULT_RECORD_LIMIT: u32 = 20;
/// Longest message excerpt shown in the record listing
const MESSAGE_PREVIEW_CHARS: usize = 60;

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

#[derive(Parser)]
#[command(name = "logwarden")]
#[command(about = "The logwarden logging facility CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

///////////////////////////////////////////////////////////////////////////////
//****                         Private Types                             ****//
///////////////////////////////////////////////////////////////////////////////

#[derive(Subcommand)]
enum Commands {
    /// View or change the logging configuration record
    #[command(name = "settings")]
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Log an error; persisted when error logging is enabled
    #[command(name = "log-error")]
    LogError {
        #[arg(long)]
        message: String,
        #[arg(long, help = "Stack trace to record instead of the captured one")]
        stack_trace: Option<String>,
    },
    /// Log a performance snapshot; persisted when performance logging is enabled
    #[command(name = "log-performance")]
    LogPerformance {
        #[arg(long, help = "Duration measured by the caller")]
        duration: Option<i64>,
        #[arg(long, help = "Stack trace to record instead of the captured one")]
        stack_trace: Option<String>,
    },
    /// Write a transient trace line
    #[command(name = "debug")]
    Debug {
        #[arg(long, help = "error, warn, info, debug or trace")]
        level: LogLevel,
        #[arg(long)]
        message: String,
    },
    /// List the most recent persisted log records
    #[command(name = "records")]
    Records {
        #[arg(long, help = "Number of records to show", value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
    },
    /// Flag a record so cleanup never deletes it
    #[command(name = "keep")]
    Keep {
        #[arg(help = "Id of the log record")]
        id: String,
        #[arg(long, help = "Clear the flag instead of setting it")]
        release: bool,
    },
    /// Delete every record not flagged do-not-delete
    #[command(name = "cleanup")]
    Cleanup {
        #[arg(long, help = "Records deleted per transaction")]
        batch_size: Option<usize>,
    },
    /// Run the cleanup scheduler until interrupted
    #[command(name = "schedule")]
    Schedule {
        #[arg(long, help = "Print the next N fire times and exit")]
        preview: Option<usize>,
    },
    /// Validate the environment configuration
    #[command(name = "env-check")]
    EnvCheck {
        #[arg(long, help = "Print an example .env file instead")]
        example: bool,
    },
    /// Database migration commands
    #[command(name = "migrate")]
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the logging configuration record
    Show,
    /// Create or update the logging configuration record
    Set {
        #[arg(long)]
        error_logging: Option<bool>,
        #[arg(long)]
        performance_logging: Option<bool>,
        #[arg(long, help = "Cleanup schedule, e.g. \"0 0 2 * * ?\"")]
        cron: Option<String>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Show migration status
    Status,
    /// Apply all pending migrations
    ApplyAll,
    /// Apply a specific migration version
    Apply {
        #[arg(help = "Migration version to apply")]
        version: u32,
    },
    /// Print a template for a new migration
    Create {
        #[arg(help = "Migration name to create")]
        name: String,
    },
    ViewSchema,
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

pub async fn parse_cli_commands(pool: &SqlitePool, config: &AppConfig) -> Result<(), LoggingError> {
    let cli = Cli::parse();
    execute_command(cli, pool, config).await
}

/// Run one parsed command
pub async fn execute_command(
    cli: Cli,
    pool: &SqlitePool,
    config: &AppConfig,
) -> Result<(), LoggingError> {
    let new_context =
        || ExecutionContext::new(pool.clone()).with_settings_name(config.settings_name.clone());

    match cli.command {
        Commands::Settings { action } => match action {
            SettingsAction::Show => {
                let ctx = new_context();
                let configuration = ctx.configuration().await?;
                println!("Settings: {}", ctx.settings_name());
                print_configuration(configuration);
            }
            SettingsAction::Set {
                error_logging,
                performance_logging,
                cron,
            } => {
                let ctx = new_context();
                let mut configuration = match ctx.configuration().await {
                    Ok(current) => current.clone(),
                    Err(LoggingError::ConfigurationMissing { found: 0, .. }) => {
                        Configuration::default()
                    }
                    Err(e) => return Err(e),
                };

                if let Some(enabled) = error_logging {
                    configuration.error_logging_enabled = enabled;
                }
                if let Some(enabled) = performance_logging {
                    configuration.performance_logging_enabled = enabled;
                }
                if let Some(expression) = cron {
                    parse_cron_schedule(&expression)?;
                    configuration.cron_schedule = expression;
                }

                config::save_configuration(pool, ctx.settings_name(), &configuration).await?;
                println!("Saved settings: {}", ctx.settings_name());
                print_configuration(&configuration);
            }
        },
        Commands::LogError {
            message,
            stack_trace,
        } => {
            let ctx = new_context();
            let factory = ErrorLoggerFactory::new(CapturedError::new(
                message,
                capture_stack_trace(),
            ));
            let kind = log_through(&ctx, &factory, stack_trace.as_deref()).await?;
            println!("{}", describe_outcome(kind, "error"));
        }
        Commands::LogPerformance {
            duration,
            stack_trace,
        } => {
            let ctx = new_context();
            let factory = PerformanceLoggerFactory::new(duration);
            let kind = log_through(&ctx, &factory, stack_trace.as_deref()).await?;
            println!("{}", describe_outcome(kind, "performance"));
        }
        Commands::Debug { level, message } => {
            let ctx = new_context();
            let logger = DebugLogger::new(Some(level), message)?;
            logger.log(&ctx).await?;
            println!("{}", describe_outcome(logger.kind(), "debug"));
        }
        Commands::Records { limit } => {
            let limit_value = i64::from(limit.unwrap_or(DEFAULT_RECORD_LIMIT));
            let rows = queries::fetch_recent_log_records(pool, limit_value).await?;
            let total = queries::count_log_records(pool).await?;

            if rows.is_empty() {
                println!("No log records stored");
                return Ok(());
            }

            println!(
                "\n=== Log Records (showing {} of {}) ===",
                rows.len(),
                total
            );
            println!(
                "{:<36} | {:<32} | {:<4} | {}",
                "ID", "Created At", "Keep", "Message"
            );
            println!("{:-<120}", "");

            for row in rows {
                let id: String = row.get("id");
                let created_at: String = row.get("created_at");
                let do_not_delete: bool = row.get("do_not_delete");
                let message: String = row.get("message");

                println!(
                    "{:<36} | {:<32} | {:<4} | {}",
                    id,
                    created_at,
                    if do_not_delete { "yes" } else { "no" },
                    preview(&message)
                );
            }
        }
        Commands::Keep { id, release } => {
            let result = queries::update_log_record_do_not_delete(pool, &id, !release).await?;
            if result.rows_affected() == 0 {
                println!("No log record with id {}", id);
            } else if release {
                println!("Released log record: {}", id);
            } else {
                println!("Kept log record: {}", id);
            }
        }
        Commands::Cleanup { batch_size } => {
            let ctx = new_context();
            let batch = LogCleanupBatch::new(batch_size.unwrap_or(config.cleanup_batch_size));
            let summary = batch.run(&ctx).await?;
            println!(
                "Deleted {} of {} log records",
                summary.deleted, summary.selected
            );
            if summary.failed_chunks > 0 {
                println!("{} chunk(s) failed and were rolled back", summary.failed_chunks);
            }
        }
        Commands::Schedule { preview } => match preview {
            Some(count) => {
                let ctx = new_context();
                let schedule = parse_cron_schedule(&ctx.configuration().await?.cron_schedule)?;
                let mut after = Utc::now();
                println!("Next {} cleanup run(s):", count);
                for _ in 0..count {
                    let Some(next) = next_fire_time(&schedule, after) else {
                        break;
                    };
                    println!("  {}", next.to_rfc3339());
                    after = next;
                }
            }
            None => {
                info!("Starting cleanup scheduler, press Ctrl+C to stop");
                crate::server::start_cleanup_scheduler(pool.clone(), config.clone()).await?;
            }
        },
        Commands::EnvCheck { example } => {
            if example {
                print!("{}", env::generate_env_example());
            } else {
                env::print_validation_results(&Ok(config.clone()));
            }
        }
        Commands::Migrate { action } => {
            let db_manager = DatabaseManager::new(pool.clone());
            let migration_cli = MigrationCli::new(db_manager);
            match action {
                MigrateAction::Status => migration_cli.list_migrations().await?,
                MigrateAction::ApplyAll => migration_cli.apply_migrations().await?,
                MigrateAction::Apply { version } => migration_cli.apply_migration(version).await?,
                MigrateAction::Create { name } => {
                    info!("Creating new migration: {}", name);
                    migration_cli.create_migration(&name)
                }
                MigrateAction::ViewSchema => migration_cli.view_schema().await?,
            }
        }
    }

    Ok(())
}

///////////////////////////////////////////////////////////////////////////////
//****                       Private Functions                           ****//
///////////////////////////////////////////////////////////////////////////////

/// Ask the factory for a logger, apply the trace override and log
async fn log_through(
    ctx: &ExecutionContext,
    factory: &dyn LoggerFactory,
    stack_trace: Option<&str>,
) -> Result<LoggerKind, LoggingError> {
    let mut logger = factory.get_logger(ctx).await?;
    if let Some(trace) = stack_trace {
        logger.set_stack_trace(trace);
    }
    logger.log(ctx).await?;
    Ok(logger.kind())
}

fn describe_outcome(kind: LoggerKind, category: &str) -> String {
    match kind {
        LoggerKind::Debug(level) => format!("Emitted {} debug message", level),
        LoggerKind::Error | LoggerKind::Performance => {
            format!("Persisted {} log record", category)
        }
    }
}

fn print_configuration(configuration: &Configuration) {
    println!("  Error logging: {}", configuration.error_logging_enabled);
    println!(
        "  Performance logging: {}",
        configuration.performance_logging_enabled
    );
    println!("  Cleanup schedule: {}", configuration.cron_schedule);
}

/// First line of a message, shortened for the listing
fn preview(message: &str) -> String {
    let first_line = message.lines().next().unwrap_or_default();
    if first_line.chars().count() > MESSAGE_PREVIEW_CHARS {
        let head: String = first_line.chars().take(MESSAGE_PREVIEW_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        first_line.to_string()
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
