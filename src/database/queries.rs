//! # Database Queries Module
//!
//! This module centralizes all database queries used by logwarden.
//! It provides well-named functions for each database operation, making it easier to
//! maintain and reuse queries across different parts of the application.
//!
//! ## Query Categories
//!
//! - **Settings Queries**: Look up and maintain logging configuration records
//! - **Log Record Queries**: Insert, list, count and purge persisted log records

use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteQueryResult, SqliteRow};
use sqlx::Row;

use crate::logging::persisted::LogRecord;

///////////////////////////////////////////////////////////////////////////////
//****                        Settings Queries                           ****//
///////////////////////////////////////////////////////////////////////////////

/// Fetch every settings row with the given name
pub async fn fetch_logging_settings_by_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Vec<SqliteRow>, sqlx::Error> {
    sqlx::query(
        "SELECT name, enable_error_logging, enable_performance_logging, scheduler_cron_string
         FROM logging_settings
         WHERE name = ?",
    )
    .bind(name)
    .fetch_all(pool)
    .await
}

/// Update the settings rows with the given name
pub async fn update_logging_settings(
    pool: &SqlitePool,
    name: &str,
    enable_error_logging: bool,
    enable_performance_logging: bool,
    scheduler_cron_string: &str,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "UPDATE logging_settings SET
            enable_error_logging = ?, enable_performance_logging = ?,
            scheduler_cron_string = ?, updated_at = CURRENT_TIMESTAMP
         WHERE name = ?",
    )
    .bind(enable_error_logging)
    .bind(enable_performance_logging)
    .bind(scheduler_cron_string)
    .bind(name)
    .execute(pool)
    .await
}

/// Insert a new settings row
pub async fn insert_logging_settings(
    pool: &SqlitePool,
    name: &str,
    enable_error_logging: bool,
    enable_performance_logging: bool,
    scheduler_cron_string: &str,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "INSERT INTO logging_settings
        (name, enable_error_logging, enable_performance_logging, scheduler_cron_string)
        VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(enable_error_logging)
    .bind(enable_performance_logging)
    .bind(scheduler_cron_string)
    .execute(pool)
    .await
}

///////////////////////////////////////////////////////////////////////////////
//****                       Log Record Queries                          ****//
///////////////////////////////////////////////////////////////////////////////

/// Insert one log record
pub async fn insert_log_record(
    pool: &SqlitePool,
    id: &str,
    record: &LogRecord,
    created_at: &str,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "INSERT INTO log_records (id, message, stack_trace, do_not_delete, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&record.message)
    .bind(&record.stack_trace)
    .bind(record.do_not_delete)
    .bind(created_at)
    .execute(pool)
    .await
}

/// Fetch the ids of every record not flagged do-not-delete
pub async fn fetch_deletable_log_record_ids(
    pool: &SqlitePool,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM log_records WHERE do_not_delete = 0 ORDER BY created_at")
        .fetch_all(pool)
        .await
}

/// Delete the given records, skipping any flagged do-not-delete
pub async fn delete_log_records_by_ids(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> Result<SqliteQueryResult, sqlx::Error> {
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "DELETE FROM log_records WHERE do_not_delete = 0 AND id IN ({})",
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id.as_str());
    }
    query.execute(conn).await
}

/// Fetch the most recent log records
pub async fn fetch_recent_log_records(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<SqliteRow>, sqlx::Error> {
    sqlx::query(
        "SELECT id, message, stack_trace, do_not_delete, created_at
         FROM log_records
         ORDER BY created_at DESC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Get count of all persisted log records
pub async fn count_log_records(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM log_records")
        .fetch_one(pool)
        .await?;
    Ok(row.get("count"))
}

/// Set or clear the do-not-delete flag of one record
pub async fn update_log_record_do_not_delete(
    pool: &SqlitePool,
    id: &str,
    do_not_delete: bool,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query("UPDATE log_records SET do_not_delete = ? WHERE id = ?")
        .bind(do_not_delete)
        .bind(id)
        .execute(pool)
        .await
}
