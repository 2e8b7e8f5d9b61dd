//! Command line tests against a throwaway database file
use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn logwarden(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("logwarden").unwrap();
    cmd.env(
        "LOGWARDEN_DB_URL",
        format!("sqlite://{}", dir.path().join("logwarden.db").display()),
    )
    .env("LOGWARDEN_LOG_LEVEL", "logwarden=info")
    .env_remove("LOGWARDEN_SETTINGS_NAME")
    .env_remove("LOGWARDEN_CLEANUP_BATCH_SIZE");
    cmd
}

#[test]
fn settings_show_reports_seeded_defaults() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(contains("Settings: Default"))
        .stdout(contains("Error logging: false"))
        .stdout(contains("Cleanup schedule: 0 0 2 * * ?"));
}

#[test]
fn log_error_is_traced_while_disabled() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .args(["log-error", "--message", "boom"])
        .assert()
        .success()
        .stdout(contains("Emitted ERROR debug message"))
        .stderr(contains("boom"));

    logwarden(&dir)
        .arg("records")
        .assert()
        .success()
        .stdout(contains("No log records stored"));
}

#[test]
fn log_error_is_persisted_once_enabled() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .args(["settings", "set", "--error-logging", "true"])
        .assert()
        .success()
        .stdout(contains("Error logging: true"));

    logwarden(&dir)
        .args(["log-error", "--message", "boom"])
        .assert()
        .success()
        .stdout(contains("Persisted error log record"));

    logwarden(&dir)
        .arg("records")
        .assert()
        .success()
        .stdout(contains("showing 1 of 1"))
        .stdout(contains("boom"));
}

#[test]
fn cleanup_purges_records() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .args(["settings", "set", "--performance-logging", "true"])
        .assert()
        .success();

    for duration in ["10", "20", "30"] {
        logwarden(&dir)
            .args(["log-performance", "--duration", duration])
            .assert()
            .success()
            .stdout(contains("Persisted performance log record"));
    }

    logwarden(&dir)
        .args(["cleanup", "--batch-size", "2"])
        .assert()
        .success()
        .stdout(contains("Deleted 3 of 3 log records"));
}

#[test]
fn schedule_preview_lists_fire_times() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .args(["settings", "set", "--cron", "0 30 1 * * ?"])
        .assert()
        .success();

    logwarden(&dir)
        .args(["schedule", "--preview", "2"])
        .assert()
        .success()
        .stdout(contains("Next 2 cleanup run(s):"))
        .stdout(contains("T01:30:00"));
}

#[test]
fn invalid_cron_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .args(["settings", "set", "--cron", "sometimes"])
        .assert()
        .failure()
        .stderr(contains("invalid cron schedule"));
}

#[test]
fn invalid_environment_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .env("LOGWARDEN_CLEANUP_BATCH_SIZE", "none")
        .args(["settings", "show"])
        .assert()
        .failure()
        .stderr(contains(
            "Environment validation failed with 1 critical error(s)",
        ))
        .stderr(contains("  CRITICAL - LOGWARDEN_CLEANUP_BATCH_SIZE"));
}

#[test]
fn migrate_status_reports_applied_versions() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .args(["migrate", "status"])
        .assert()
        .success()
        .stdout(contains("Applied migrations: [1, 2]"))
        .stdout(contains("Pending migrations: []"));
}

#[test]
fn env_check_example_is_printed() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .args(["env-check", "--example"])
        .assert()
        .success()
        .stdout(contains("LOGWARDEN_CLEANUP_BATCH_SIZE=200"))
        .stdout(contains("LOGWARDEN_SETTINGS_NAME=Default"));
}

#[test]
fn migrate_apply_unknown_version_fails() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .args(["migrate", "apply", "99"])
        .assert()
        .failure()
        .stderr(contains("migration 99: not found"));
}

#[test]
fn migrate_apply_twice_fails() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .args(["migrate", "apply", "1"])
        .assert()
        .failure()
        .stderr(contains("migration 1: already applied"));
}

#[test]
fn records_rejects_negative_limit() {
    let dir = tempfile::tempdir().unwrap();
    logwarden(&dir)
        .args(["records", "--limit", "-1"])
        .assert()
        .failure();
}
