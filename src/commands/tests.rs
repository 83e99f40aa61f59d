//! Tests for command implementations, run against on-disk configs.

use super::*;
use crate::cli::{LockListArgs, LockShowArgs, ServeArgs};
use crate::locks::LockStore;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write a config with one task whose store lives inside `dir`.
fn write_config(dir: &TempDir, command: &str, at_least: &str) -> PathBuf {
    let yaml = format!(
        r#"
holder_id: test-node
store:
  kind: sqlite
  path: {db}
tasks:
  - name: job
    cron: "0 */2 * * * *"
    lock_at_most_for: 5m
    lock_at_least_for: {at_least}
    command: "{command}"
"#,
        db = dir.path().join("locks.db").display(),
        at_least = at_least,
        command = command,
    );
    let path = dir.path().join("schedlock.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

fn open_db(dir: &TempDir) -> crate::locks::SqliteLockStore {
    crate::locks::SqliteLockStore::open(dir.path().join("locks.db"), crate::locks::DEFAULT_TABLE)
        .unwrap()
}

#[test]
fn check_accepts_valid_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "true", "0s");
    assert!(dispatch(&path, Command::Check).is_ok());
}

#[test]
fn check_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "true", "10m");
    let err = dispatch(&path, Command::Check).unwrap_err();
    assert!(matches!(err, SchedLockError::ConfigInvalid(_)));
    assert_eq!(err.exit_code(), crate::exit_codes::CONFIG_INVALID);
}

#[test]
fn missing_config_is_user_error() {
    let dir = TempDir::new().unwrap();
    let err = dispatch(&dir.path().join("nope.yaml"), Command::Check).unwrap_err();
    assert!(matches!(err, SchedLockError::UserError(_)));
}

#[cfg(unix)]
#[test]
fn run_records_lock_and_honours_at_least() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "true", "1m");

    let run = || {
        dispatch(
            &path,
            Command::Run(RunArgs {
                task: "job".to_string(),
            }),
        )
    };
    run().unwrap();

    let record = open_db(&dir).find("job").unwrap().unwrap();
    assert_eq!(record.locked_by, "test-node");
    assert!(record.is_held(Utc::now()));

    // The second run lands inside lock_at_least_for and is skipped, not failed.
    run().unwrap();
    let again = open_db(&dir).find("job").unwrap().unwrap();
    assert_eq!(again.locked_at, record.locked_at);
}

#[cfg(unix)]
#[test]
fn run_failure_is_task_failed() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "false", "0s");

    let err = dispatch(
        &path,
        Command::Run(RunArgs {
            task: "job".to_string(),
        }),
    )
    .unwrap_err();
    assert!(matches!(err, SchedLockError::TaskFailed(_)));
    assert_eq!(err.exit_code(), crate::exit_codes::TASK_FAILURE);

    // Released despite the failure.
    let record = open_db(&dir).find("job").unwrap().unwrap();
    assert!(!record.is_held(Utc::now() + chrono::Duration::seconds(1)));
}

#[test]
fn run_unknown_task_is_user_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "true", "0s");
    let err = dispatch(
        &path,
        Command::Run(RunArgs {
            task: "other".to_string(),
        }),
    )
    .unwrap_err();
    assert!(matches!(err, SchedLockError::UserError(_)));
}

#[test]
fn next_lists_fire_times() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "true", "0s");
    assert!(
        dispatch(
            &path,
            Command::Next(NextArgs {
                task: "job".to_string(),
                count: 3,
            }),
        )
        .is_ok()
    );
    assert!(
        dispatch(
            &path,
            Command::Next(NextArgs {
                task: "missing".to_string(),
                count: 3,
            }),
        )
        .is_err()
    );
}

#[test]
fn lock_commands_read_the_table() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "true", "0s");

    // Empty table.
    assert!(lock::cmd_lock_list(&path, LockListArgs { json: false }).is_ok());
    let err = lock::cmd_lock_show(
        &path,
        LockShowArgs {
            name: "job".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, SchedLockError::UserError(_)));

    let now = Utc::now();
    open_db(&dir)
        .try_acquire("job", now, now + chrono::Duration::minutes(5), "elsewhere")
        .unwrap();

    assert!(lock::cmd_lock_list(&path, LockListArgs { json: true }).is_ok());
    assert!(lock::cmd_lock_list(&path, LockListArgs { json: false }).is_ok());
    assert!(
        lock::cmd_lock_show(
            &path,
            LockShowArgs {
                name: "job".to_string(),
            },
        )
        .is_ok()
    );
}

#[test]
fn serve_stops_after_duration() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "true", "0s");
    let result = dispatch(
        &path,
        Command::Serve(ServeArgs {
            run_for: Some("200ms".to_string()),
        }),
    );
    assert!(result.is_ok());
}

#[test]
fn serve_rejects_empty_task_list() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schedlock.yaml");
    std::fs::write(&path, "store:\n  kind: memory\n").unwrap();
    let err = dispatch(&path, Command::Serve(ServeArgs { run_for: None })).unwrap_err();
    assert!(matches!(err, SchedLockError::UserError(_)));
}

#[test]
fn serve_rejects_bad_run_for() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "true", "0s");
    let err = dispatch(
        &path,
        Command::Serve(ServeArgs {
            run_for: Some("soon".to_string()),
        }),
    )
    .unwrap_err();
    assert!(matches!(err, SchedLockError::ConfigInvalid(_)));
}
