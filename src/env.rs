//! Environment variable validation and configuration module for logwarden
//!
//! This module provides centralized validation and configuration management
//! for all environment variables read by the logwarden binary.
//!
//! # Supported Environment Variables
//!
//! ## Database Configuration
//! - `LOGWARDEN_DB_URL`: Database connection URL (default: "sqlite://logwarden.db")
//!
//! ## Logging Configuration
//! - `RUST_LOG`: Standard Rust logging configuration
//! - `LOGWARDEN_LOG_LEVEL`: Application-specific log level override
//!
//! ## Cleanup Configuration
//! - `LOGWARDEN_CLEANUP_BATCH_SIZE`: Records deleted per cleanup chunk (default: "200")
//! - `LOGWARDEN_SETTINGS_NAME`: Name of the logging settings row to read (default: "Default")
//!
//! # Usage
//!
//! ```rust,no_run
//! use logwarden::env::get_config;
//!
//! // Exits the process when a critical variable is invalid
//! let config = get_config();
//! println!("Database: {}", config.database_url);
//! ```
//!
//! Validation runs before the tracing subscriber exists, so non-critical
//! notices are kept on the config and written out by `AppConfig::log_notices`.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{info, warn};

use crate::cleanup::{DEFAULT_CLEANUP_BATCH_SIZE, MAX_CLEANUP_BATCH_SIZE};
use crate::config::DEFAULT_SETTINGS_NAME;
use crate::database::DEFAULT_DATABASE_URL;

/// Default tracing filter when neither `LOGWARDEN_LOG_LEVEL` nor `RUST_LOG` is set
pub const DEFAULT_LOG_LEVEL: &str = "logwarden=info";

/// Environment validation errors
#[derive(Debug, Clone)]
pub struct EnvValidationError {
    pub variable: String,
    pub message: String,
    pub severity: ErrorSeverity,
}

/// Severity level for environment validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    /// Critical errors that prevent application startup
    Critical,
    /// Warnings about suspicious values that were corrected
    Warning,
    /// Informational messages about default values being used
    Info,
}

/// Validated application configuration derived from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Database
    pub database_url: String,

    // Logging
    pub log_level: String,

    // Cleanup
    pub cleanup_batch_size: usize,
    pub settings_name: String,

    /// Non-critical validation messages, reported once logging is up
    pub notices: Vec<EnvValidationError>,
}

impl AppConfig {
    /// Emit the non-critical validation notices through tracing
    pub fn log_notices(&self) {
        for notice in &self.notices {
            match notice.severity {
                ErrorSeverity::Warning => warn!("{}: {}", notice.variable, notice.message),
                ErrorSeverity::Info => info!("{}: {}", notice.variable, notice.message),
                ErrorSeverity::Critical => {}
            }
        }
    }
}

/// Validate all environment variables and return configuration or errors
pub fn validate_environment() -> Result<AppConfig, Vec<EnvValidationError>> {
    validate_with(|name| env::var(name).ok())
}

/// Validate configuration read through `lookup` instead of the process environment
pub fn validate_with<F>(lookup: F) -> Result<AppConfig, Vec<EnvValidationError>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Database configuration
    let database_url = lookup("LOGWARDEN_DB_URL").unwrap_or_else(|| {
        warnings.push(EnvValidationError {
            variable: "LOGWARDEN_DB_URL".to_string(),
            message: format!("Using default database URL '{}'", DEFAULT_DATABASE_URL),
            severity: ErrorSeverity::Info,
        });
        DEFAULT_DATABASE_URL.to_string()
    });

    if !database_url.starts_with("sqlite:") {
        errors.push(EnvValidationError {
            variable: "LOGWARDEN_DB_URL".to_string(),
            message: format!("Unsupported database URL '{}', expected sqlite:", database_url),
            severity: ErrorSeverity::Critical,
        });
    }

    // Logging configuration
    let log_level = lookup("LOGWARDEN_LOG_LEVEL")
        .or_else(|| lookup("RUST_LOG"))
        .unwrap_or_else(|| {
            warnings.push(EnvValidationError {
                variable: "RUST_LOG/LOGWARDEN_LOG_LEVEL".to_string(),
                message: format!("Using default log level '{}'", DEFAULT_LOG_LEVEL),
                severity: ErrorSeverity::Info,
            });
            DEFAULT_LOG_LEVEL.to_string()
        });

    // Cleanup configuration
    let cleanup_batch_size = match parse_env_var_with_default(
        &lookup,
        "LOGWARDEN_CLEANUP_BATCH_SIZE",
        DEFAULT_CLEANUP_BATCH_SIZE,
        &mut warnings,
    ) {
        Ok(0) => {
            errors.push(EnvValidationError {
                variable: "LOGWARDEN_CLEANUP_BATCH_SIZE".to_string(),
                message: "Batch size must be at least 1".to_string(),
                severity: ErrorSeverity::Critical,
            });
            DEFAULT_CLEANUP_BATCH_SIZE
        }
        Ok(size) if size > MAX_CLEANUP_BATCH_SIZE => {
            warnings.push(EnvValidationError {
                variable: "LOGWARDEN_CLEANUP_BATCH_SIZE".to_string(),
                message: format!(
                    "Batch size {} exceeds the maximum, using {}",
                    size, MAX_CLEANUP_BATCH_SIZE
                ),
                severity: ErrorSeverity::Warning,
            });
            MAX_CLEANUP_BATCH_SIZE
        }
        Ok(size) => size,
        Err(error) => {
            errors.push(error);
            DEFAULT_CLEANUP_BATCH_SIZE
        }
    };

    let settings_name = lookup("LOGWARDEN_SETTINGS_NAME").unwrap_or_else(|| {
        warnings.push(EnvValidationError {
            variable: "LOGWARDEN_SETTINGS_NAME".to_string(),
            message: format!("Using default settings name '{}'", DEFAULT_SETTINGS_NAME),
            severity: ErrorSeverity::Info,
        });
        DEFAULT_SETTINGS_NAME.to_string()
    });

    if settings_name.trim().is_empty() {
        errors.push(EnvValidationError {
            variable: "LOGWARDEN_SETTINGS_NAME".to_string(),
            message: "Settings name cannot be empty".to_string(),
            severity: ErrorSeverity::Critical,
        });
    }

    if !errors.is_empty() {
        errors.extend(warnings);
        return Err(errors);
    }

    Ok(AppConfig {
        database_url,
        log_level,
        cleanup_batch_size,
        settings_name,
        notices: warnings,
    })
}

/// Get the validated configuration, exiting the process if validation fails
pub fn get_config() -> AppConfig {
    match validate_environment() {
        Ok(config) => config,
        Err(errors) => {
            print_validation_results(&Err(errors));
            std::process::exit(1);
        }
    }
}

/// Print environment validation results in a user-friendly format
pub fn print_validation_results(result: &Result<AppConfig, Vec<EnvValidationError>>) {
    match result {
        Ok(config) => {
            println!("Environment validation successful");
            println!("Configuration:");
            println!("  Database URL: {}", config.database_url);
            println!("  Log Level: {}", config.log_level);
            println!("  Cleanup Batch Size: {}", config.cleanup_batch_size);
            println!("  Settings Name: {}", config.settings_name);
            for notice in &config.notices {
                let prefix = match notice.severity {
                    ErrorSeverity::Warning => "WARNING",
                    _ => "INFO",
                };
                println!("  {} - {}: {}", prefix, notice.variable, notice.message);
            }
        }
        Err(errors) => {
            let critical_count = errors
                .iter()
                .filter(|e| e.severity == ErrorSeverity::Critical)
                .count();
            let warning_count = errors
                .iter()
                .filter(|e| e.severity == ErrorSeverity::Warning)
                .count();

            eprintln!(
                "Environment validation failed with {} critical error(s), {} warning(s):",
                critical_count, warning_count
            );

            for error in errors {
                let prefix = match error.severity {
                    ErrorSeverity::Critical => "CRITICAL",
                    ErrorSeverity::Warning => "WARNING",
                    ErrorSeverity::Info => "INFO",
                };
                eprintln!("  {} - {}: {}", prefix, error.variable, error.message);
            }
        }
    }
}

/// Generate example environment configuration file
pub fn generate_env_example() -> String {
    format!(
        r#"# logwarden Environment Configuration
# Copy this file to .env and customize the values for your deployment

# =============================================================================
# Database Configuration
# =============================================================================

# Database connection URL
# Default: {db_url}
# Examples:
#   LOGWARDEN_DB_URL=sqlite://logwarden.db
#   LOGWARDEN_DB_URL=sqlite:///var/lib/logwarden/logwarden.db
LOGWARDEN_DB_URL={db_url}

# =============================================================================
# Logging Configuration
# =============================================================================

# Log level configuration
# Default: {log_level}
# Examples:
#   RUST_LOG=debug                    # Everything at debug level
#   LOGWARDEN_LOG_LEVEL=logwarden=trace  # Override for logwarden only
RUST_LOG={log_level}

# =============================================================================
# Cleanup Configuration
# =============================================================================

# Records deleted per cleanup chunk, each chunk runs in its own transaction
# Default: {batch_size} (maximum {max_batch_size})
LOGWARDEN_CLEANUP_BATCH_SIZE={batch_size}

# Name of the logging settings row read by every execution context
# Default: {settings_name}
LOGWARDEN_SETTINGS_NAME={settings_name}
"#,
        db_url = DEFAULT_DATABASE_URL,
        log_level = DEFAULT_LOG_LEVEL,
        batch_size = DEFAULT_CLEANUP_BATCH_SIZE,
        max_batch_size = MAX_CLEANUP_BATCH_SIZE,
        settings_name = DEFAULT_SETTINGS_NAME,
    )
}

/// Helper function to parse a numeric variable with default value.
/// Unparseable values are critical.
fn parse_env_var_with_default<F, T>(
    lookup: &F,
    var_name: &str,
    default: T,
    warnings: &mut Vec<EnvValidationError>,
) -> Result<T, EnvValidationError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(var_name) {
        Some(value_str) => value_str.trim().parse::<T>().map_err(|e| EnvValidationError {
            variable: var_name.to_string(),
            message: format!("Invalid value '{}': {}", value_str, e),
            severity: ErrorSeverity::Critical,
        }),
        None => {
            warnings.push(EnvValidationError {
                variable: var_name.to_string(),
                message: format!("Using default value: {}", default),
                severity: ErrorSeverity::Info,
            });
            Ok(default)
        }
    }
}
