//!
//! # Database Module for logwarden
//!
//! This module provides database management for the logging facility.
//! It handles database initialization, connection management, and schema migrations.
//!
//! ## Features
//!
//! - **Database Initialization**: Creates the SQLite database file and migrations table if needed.
//! - **Connection Management**: Provides database connection pool management.
//! - **Migration Control**: Tracks and applies migrations; a new database gets all of them.
//! - **CLI Support**: Commands to create, list, and apply migrations.
//!
//! ## Schema
//!
//! - `logging_settings`: the configuration records, looked up by name
//! - `log_records`: persisted error and performance logs
//! - `migrations`: applied migration versions

pub mod queries;

use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePool, Row, Sqlite};
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::logging::errors::LoggingError;

/// Database used when `LOGWARDEN_DB_URL` is not set
pub const DEFAULT_DATABASE_URL: &str = "sqlite://logwarden.db";

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Database manager that handles initialization and migrations
pub struct DatabaseManager {
    pool: SqlitePool,
}

/// Represents a database migration with version and SQL
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub name: String,
    pub sql: String,
}

impl DatabaseManager {
    /// Create a new manager with a connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the database, creating the file and schema if it doesn't exist
    pub async fn connect_with_file_creation(database_url: &str) -> Result<Self, sqlx::Error> {
        info!("Opening log store at: {}", database_url);

        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            info!("Database does not exist at {}, creating it", database_url);
            Sqlite::create_database(database_url).await?;

            let pool = SqlitePool::connect(database_url).await?;
            sqlx::query("SELECT 1").execute(&pool).await?;
            info!("Database created successfully at {}", database_url);

            let db_manager = Self::new(pool);
            db_manager.create_migrations_table().await?;
            db_manager.apply_pending_migrations().await?;
            info!("Initial migrations applied successfully.");
            return Ok(db_manager);
        }

        let pool = SqlitePool::connect(database_url).await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Initialize the database by creating the migrations table if needed
    pub async fn initialize(&self) -> Result<(), sqlx::Error> {
        info!("Initializing database...");
        self.create_migrations_table().await?;
        let (_applied, pending) = self.migration_status().await?;
        if !pending.is_empty() {
            warn!("Pending migrations: {:?}", pending);
        } else {
            info!("No pending migrations.");
        }
        Ok(())
    }

    /// Create the migrations tracking table
    async fn create_migrations_table(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get all available migrations in order
    fn get_migrations(&self) -> Vec<Migration> {
        vec![
            Migration {
                version: 1,
                name: "logging_schema".to_string(),
                sql: r#"
                    -- Lookups by name must match exactly one row, name is not unique
                    CREATE TABLE IF NOT EXISTS logging_settings (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        name TEXT NOT NULL,
                        enable_error_logging BOOLEAN NOT NULL DEFAULT 0,
                        enable_performance_logging BOOLEAN NOT NULL DEFAULT 0,
                        scheduler_cron_string TEXT NOT NULL DEFAULT '0 0 2 * * ?',
                        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                    );
                    CREATE TABLE IF NOT EXISTS log_records (
                        id TEXT PRIMARY KEY,
                        message TEXT NOT NULL,
                        stack_trace TEXT NOT NULL DEFAULT '',
                        do_not_delete BOOLEAN NOT NULL DEFAULT 0,
                        created_at TEXT NOT NULL
                    );
                    -- Default settings: nothing persisted, cleanup daily at 02:00
                    INSERT INTO logging_settings (name) VALUES ('Default');
                "#
                .to_string(),
            },
            Migration {
                version: 2,
                name: "log_records_retention_index".to_string(),
                sql: r#"
                    CREATE INDEX IF NOT EXISTS idx_log_records_do_not_delete ON log_records(do_not_delete);
                    CREATE INDEX IF NOT EXISTS idx_log_records_created_at ON log_records(created_at);
                "#
                .to_string(),
            },
        ]
    }

    /// Get applied migrations as a map (version -> name)
    async fn get_applied_migrations(&self) -> Result<HashMap<u32, String>, sqlx::Error> {
        let rows = sqlx::query("SELECT version, name FROM migrations ORDER BY version")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.get("version"), row.get("name")))
            .collect())
    }

    /// Check migration status: returns (applied, pending) versions
    pub async fn migration_status(&self) -> Result<(Vec<u32>, Vec<u32>), sqlx::Error> {
        let all_migrations = self.get_migrations();
        let applied_migrations = self.get_applied_migrations().await?;
        let mut applied = Vec::new();
        let mut pending = Vec::new();

        for migration in all_migrations {
            if applied_migrations.contains_key(&migration.version) {
                applied.push(migration.version);
            } else {
                pending.push(migration.version);
            }
        }

        applied.sort();
        pending.sort();
        Ok((applied, pending))
    }

    /// Apply all pending migrations in order
    pub async fn apply_pending_migrations(&self) -> Result<(), sqlx::Error> {
        let migrations = self.get_migrations();
        let applied_migrations = self.get_applied_migrations().await?;

        for migration in migrations {
            if !applied_migrations.contains_key(&migration.version) {
                self.run_migration(&migration).await.map_err(|e| {
                    error!("Failed to apply migration {}: {}", migration.version, e);
                    e
                })?;
            }
        }
        Ok(())
    }

    /// Apply a specific migration by version (for manual control)
    pub async fn apply_migration(&self, version: u32) -> Result<(), LoggingError> {
        let migration = self
            .get_migrations()
            .into_iter()
            .find(|m| m.version == version)
            .ok_or_else(|| LoggingError::Migration {
                version,
                reason: "not found".to_string(),
            })?;

        let applied_migrations = self.get_applied_migrations().await?;
        if applied_migrations.contains_key(&version) {
            return Err(LoggingError::Migration {
                version,
                reason: "already applied".to_string(),
            });
        }

        self.run_migration(&migration)
            .await
            .map_err(|e| LoggingError::Migration {
                version,
                reason: e.to_string(),
            })
    }

    /// Run the migration SQL and record it in one transaction
    async fn run_migration(&self, migration: &Migration) -> Result<(), sqlx::Error> {
        info!("Applying migration {}: {}", migration.version, migration.name);
        let mut tx = self.pool.begin().await?;
        sqlx::query(&migration.sql).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO migrations (version, name) VALUES (?, ?)")
            .bind(migration.version)
            .bind(&migration.name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!("Applied migration {}: {}", migration.version, migration.name);
        Ok(())
    }

    /// Create a new migration template (for CLI)
    pub fn create_migration_template(&self, name: &str) -> Migration {
        let migrations = self.get_migrations();
        let next_version = migrations.iter().map(|m| m.version).max().unwrap_or(0) + 1;
        Migration {
            version: next_version,
            name: name.to_string(),
            sql: "-- SQL for migration goes here".to_string(),
        }
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn into_pool(self) -> SqlitePool {
        self.pool
    }
}

/// CLI command implementations for migrations.
pub struct MigrationCli {
    db_manager: DatabaseManager,
}

impl MigrationCli {
    pub fn new(db_manager: DatabaseManager) -> Self {
        Self { db_manager }
    }

    /// CLI command: List migration status
    pub async fn list_migrations(&self) -> Result<(), sqlx::Error> {
        let (applied, pending) = self.db_manager.migration_status().await?;
        println!("Applied migrations: {:?}", applied);
        println!("Pending migrations: {:?}", pending);
        Ok(())
    }

    /// CLI command: Apply all pending migrations
    pub async fn apply_migrations(&self) -> Result<(), sqlx::Error> {
        self.db_manager.apply_pending_migrations().await?;
        println!("All pending migrations applied.");
        Ok(())
    }

    pub async fn apply_migration(&self, version: u32) -> Result<(), LoggingError> {
        self.db_manager.apply_migration(version).await?;
        println!("Migration {} applied successfully.", version);
        Ok(())
    }

    /// CLI command: Create a new migration template
    pub fn create_migration(&self, name: &str) {
        let migration = self.db_manager.create_migration_template(name);
        println!(
            "New migration template (add to get_migrations):\n\
            \tMigration {{\n\
            \t\tversion: {},\n\
            \t\tname: \"{}\".to_string(),\n\
            \t\tsql: \"{}\".to_string(),\n\
            \t}},",
            migration.version, migration.name, migration.sql
        );
    }

    /// CLI command: View the schema of all tables in the database
    pub async fn view_schema(&self) -> Result<(), sqlx::Error> {
        let tables = sqlx::query("SELECT name FROM sqlite_master WHERE type='table'")
            .fetch_all(&self.db_manager.pool)
            .await?;

        for table in tables {
            let table_name: String = table.get("name");
            println!("Schema for table '{}':", table_name);
            let schema = sqlx::query(&format!("PRAGMA table_info({})", table_name))
                .fetch_all(&self.db_manager.pool)
                .await?;
            for column in schema {
                println!(
                    "\t{}: {} ({})",
                    column.get::<String, _>("name"),
                    column.get::<String, _>("type"),
                    if column.get::<i64, _>("pk") > 0 { "PK" } else { "" }
                );
            }
        }
        Ok(())
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Open (or create) the database and report pending migrations
pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let db_manager = DatabaseManager::connect_with_file_creation(database_url).await?;
    db_manager.initialize().await?;
    Ok(db_manager.into_pool())
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
