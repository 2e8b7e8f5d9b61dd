//! End to end scenarios across factories, loggers, the store and cleanup
use std::sync::Arc;

use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::cleanup::LogCleanupBatch;
use crate::config::{self, Configuration, DEFAULT_SETTINGS_NAME};
use crate::context::ExecutionContext;
use crate::database::{DatabaseManager, queries};
use crate::logging::LogLevel;
use crate::logging::errors::{CapturedError, LoggingError};
use crate::logging::factory::{ErrorLoggerFactory, LoggerFactory, PerformanceLoggerFactory};
use crate::logging::logger::LoggerKind;
use crate::logging::sink::MemorySink;

async fn setup_store(error_logging: bool, performance_logging: bool) -> SqlitePool {
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
        ..Configuration::default()
    };
    config::save_configuration(&pool, DEFAULT_SETTINGS_NAME, &settings)
        .await
        .unwrap();
    pool
}

fn context_with_sink(pool: &SqlitePool) -> (ExecutionContext, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let ctx = ExecutionContext::new(pool.clone()).with_sink(sink.clone());
    (ctx, sink)
}

async fn stored_messages(pool: &SqlitePool) -> Vec<String> {
    queries::fetch_recent_log_records(pool, 100)
        .await
        .unwrap()
        .iter()
        .map(|row| row.get("message"))
        .collect()
}

#[inline(never)]
fn parse_invoice_total(raw: &str) -> CapturedError {
    let err = raw.parse::<i64>().unwrap_err();
    CapturedError::from_error(&err)
}

#[tokio::test]
async fn enabled_error_logging_persists_one_record() {
    let pool = setup_store(true, false).await;
    let (ctx, sink) = context_with_sink(&pool);

    let factory = ErrorLoggerFactory::new(CapturedError::new("boom", "at checkout"));
    let logger = factory.get_logger(&ctx).await.unwrap();
    assert_eq!(logger.kind(), LoggerKind::Error);
    logger.log(&ctx).await.unwrap();

    let rows = queries::fetch_recent_log_records(&pool, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<String, _>("message"), "boom");
    assert_eq!(rows[0].get::<String, _>("stack_trace"), "at checkout");
    assert!(!rows[0].get::<bool, _>("do_not_delete"));
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn disabled_error_logging_writes_one_error_line() {
    let pool = setup_store(false, false).await;
    let (ctx, sink) = context_with_sink(&pool);

    let factory = ErrorLoggerFactory::new(CapturedError::new("boom", "at checkout"));
    let mut logger = factory.get_logger(&ctx).await.unwrap();
    logger.set_stack_trace("at worker").log(&ctx).await.unwrap();

    assert!(stored_messages(&pool).await.is_empty());
    assert_eq!(
        sink.lines(),
        vec![(LogLevel::Error, "boom\nAt: at worker".to_string())]
    );
}

#[tokio::test]
async fn override_replaces_captured_error_trace() {
    let pool = setup_store(true, false).await;
    let ctx = ExecutionContext::new(pool.clone());

    let factory = ErrorLoggerFactory::new(parse_invoice_total("12x"));
    let mut logger = factory.get_logger(&ctx).await.unwrap();
    logger.set_stack_trace("custom trace");
    logger.log(&ctx).await.unwrap();

    let rows = queries::fetch_recent_log_records(&pool, 10).await.unwrap();
    assert_eq!(rows[0].get::<String, _>("stack_trace"), "custom trace");
    assert_eq!(
        rows[0].get::<String, _>("message"),
        "invalid digit found in string"
    );
}

#[tokio::test]
async fn captured_error_trace_names_the_failing_call_site() {
    let pool = setup_store(true, false).await;
    let ctx = ExecutionContext::new(pool.clone());

    let factory = ErrorLoggerFactory::new(parse_invoice_total("12x"));
    factory.get_logger(&ctx).await.unwrap().log(&ctx).await.unwrap();

    let rows = queries::fetch_recent_log_records(&pool, 10).await.unwrap();
    let trace: String = rows[0].get("stack_trace");
    assert!(trace.contains("parse_invoice_total"), "trace was: {}", trace);
}

#[tokio::test]
async fn enabled_performance_logging_persists_snapshot() {
    let pool = setup_store(false, true).await;
    let ctx = ExecutionContext::new(pool.clone());

    let factory = PerformanceLoggerFactory::new(Some(1500));
    let logger = factory.get_logger(&ctx).await.unwrap();
    assert_eq!(logger.kind(), LoggerKind::Performance);
    logger.log(&ctx).await.unwrap();

    let messages = stored_messages(&pool).await;
    assert_eq!(messages.len(), 1);
    let snapshot: Value = serde_json::from_str(&messages[0]).unwrap();
    let object = snapshot.as_object().unwrap();
    assert_eq!(object.len(), 7);
    assert_eq!(object["raw_duration"], 1500);
    // the configuration lookup went through this context
    assert_eq!(object["queries"], 1);
    assert!(object["heap_size_bytes"].as_u64().is_some());
}

#[tokio::test]
async fn disabled_performance_logging_writes_info_line() {
    let pool = setup_store(false, false).await;
    let (ctx, sink) = context_with_sink(&pool);

    let factory = PerformanceLoggerFactory::new(None);
    let mut logger = factory.get_logger(&ctx).await.unwrap();
    logger.set_stack_trace("at report").log(&ctx).await.unwrap();

    assert!(stored_messages(&pool).await.is_empty());
    assert_eq!(
        sink.lines(),
        vec![(LogLevel::Info, "null\nAt: at report".to_string())]
    );
}

#[tokio::test]
async fn categories_are_gated_independently() {
    let pool = setup_store(true, false).await;
    let (ctx, sink) = context_with_sink(&pool);

    let error_factory = ErrorLoggerFactory::new(CapturedError::new("boom", "trace"));
    error_factory.get_logger(&ctx).await.unwrap().log(&ctx).await.unwrap();

    let perf_factory = PerformanceLoggerFactory::new(Some(42));
    let mut logger = perf_factory.get_logger(&ctx).await.unwrap();
    logger.set_stack_trace("t").log(&ctx).await.unwrap();

    assert_eq!(stored_messages(&pool).await, vec!["boom".to_string()]);
    assert_eq!(sink.lines(), vec![(LogLevel::Info, "42\nAt: t".to_string())]);

    // one configuration read served both factories
    let usage = ctx.usage().snapshot(None);
    assert_eq!(usage.queries, 1);
    assert_eq!(usage.dml_statements, 1);
}

#[tokio::test]
async fn configuration_change_is_seen_by_new_context_only() {
    let pool = setup_store(false, false).await;
    let (ctx, sink) = context_with_sink(&pool);
    let factory = ErrorLoggerFactory::new(CapturedError::new("boom", "trace"));

    factory.get_logger(&ctx).await.unwrap().log(&ctx).await.unwrap();

    let enabled = Configuration {
        error_logging_enabled: true,
        ..Configuration::default()
    };
    config::save_configuration(&pool, DEFAULT_SETTINGS_NAME, &enabled)
        .await
        .unwrap();

    factory.get_logger(&ctx).await.unwrap().log(&ctx).await.unwrap();
    assert_eq!(sink.lines().len(), 2);
    assert!(stored_messages(&pool).await.is_empty());

    let fresh = ExecutionContext::new(pool.clone());
    factory.get_logger(&fresh).await.unwrap().log(&fresh).await.unwrap();
    assert_eq!(stored_messages(&pool).await.len(), 1);
}

#[tokio::test]
async fn ambiguous_configuration_fails_get_logger() {
    let pool = setup_store(true, true).await;
    queries::insert_logging_settings(&pool, DEFAULT_SETTINGS_NAME, false, false, "0 0 2 * * ?")
        .await
        .unwrap();

    let ctx = ExecutionContext::new(pool.clone());
    let result = ErrorLoggerFactory::new(CapturedError::new("boom", "trace"))
        .get_logger(&ctx)
        .await;
    assert!(matches!(
        result,
        Err(LoggingError::ConfigurationMissing { found: 2, .. })
    ));
}

#[tokio::test]
async fn persistence_failure_reaches_the_caller() {
    let pool = setup_store(true, false).await;
    let ctx = ExecutionContext::new(pool.clone());
    let logger = ErrorLoggerFactory::new(CapturedError::new("boom", "trace"))
        .get_logger(&ctx)
        .await
        .unwrap();

    sqlx::query("DROP TABLE log_records")
        .execute(&pool)
        .await
        .unwrap();

    let result = logger.log(&ctx).await;
    assert!(matches!(result, Err(LoggingError::Database(_))));
}

#[tokio::test]
async fn cleanup_keeps_only_flagged_records() {
    let pool = setup_store(true, true).await;
    let ctx = ExecutionContext::new(pool.clone());

    for message in ["first", "second", "third"] {
        ErrorLoggerFactory::new(CapturedError::new(message, "trace"))
            .get_logger(&ctx)
            .await
            .unwrap()
            .log(&ctx)
            .await
            .unwrap();
    }

    let keep_id: String =
        sqlx::query_scalar("SELECT id FROM log_records WHERE message = 'second'")
            .fetch_one(&pool)
            .await
            .unwrap();
    queries::update_log_record_do_not_delete(&pool, &keep_id, true)
        .await
        .unwrap();

    let summary = LogCleanupBatch::new(2)
        .run(&ExecutionContext::new(pool.clone()))
        .await
        .unwrap();
    assert_eq!(summary.selected, 2);
    assert_eq!(summary.deleted, 2);
    assert_eq!(stored_messages(&pool).await, vec!["second".to_string()]);
}
