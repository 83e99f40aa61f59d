//! Error types for schedlock.
//!
//! Uses thiserror for derive macros. Lock contention is deliberately absent:
//! a held lock is a normal outcome (`None` from the manager), not an error.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for schedlock operations.
///
/// Each variant maps to a process exit code for the CLI.
#[derive(Error, Debug)]
pub enum SchedLockError {
    /// Invalid configuration: bad cron, bad duration, `at_least > at_most`, ...
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The lock store could not be reached or failed mid-operation.
    #[error("Lock store unavailable: {0}")]
    LockUnavailable(String),

    /// The guarded task body returned an error or panicked.
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// Shortening the lock after the task finished failed.
    #[error("Lock release failed: {0}")]
    ReleaseFailed(String),

    /// The process could not start its scheduler threads.
    #[error("Failed to start scheduler: {0}")]
    SchedulerFailed(String),

    /// User provided invalid arguments or referenced something that does not exist.
    #[error("{0}")]
    UserError(String),
}

impl SchedLockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SchedLockError::UserError(_) => exit_codes::USER_ERROR,
            SchedLockError::ConfigInvalid(_) => exit_codes::CONFIG_INVALID,
            SchedLockError::LockUnavailable(_) => exit_codes::STORE_FAILURE,
            SchedLockError::ReleaseFailed(_) => exit_codes::STORE_FAILURE,
            SchedLockError::TaskFailed(_) => exit_codes::TASK_FAILURE,
            SchedLockError::SchedulerFailed(_) => exit_codes::RUNTIME_FAILURE,
        }
    }
}

impl From<rusqlite::Error> for SchedLockError {
    fn from(err: rusqlite::Error) -> Self {
        SchedLockError::LockUnavailable(err.to_string())
    }
}

/// Result type alias for schedlock operations.
pub type Result<T> = std::result::Result<T, SchedLockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_invalid_has_correct_exit_code() {
        let err = SchedLockError::ConfigInvalid("bad cron".to_string());
        assert_eq!(err.exit_code(), exit_codes::CONFIG_INVALID);
    }

    #[test]
    fn store_errors_share_exit_code() {
        let unavailable = SchedLockError::LockUnavailable("db gone".to_string());
        let release = SchedLockError::ReleaseFailed("db gone".to_string());
        assert_eq!(unavailable.exit_code(), exit_codes::STORE_FAILURE);
        assert_eq!(release.exit_code(), exit_codes::STORE_FAILURE);
    }

    #[test]
    fn scheduler_failure_is_not_a_user_error() {
        let err = SchedLockError::SchedulerFailed("Resource temporarily unavailable".to_string());
        assert_eq!(err.exit_code(), exit_codes::RUNTIME_FAILURE);
        assert_ne!(err.exit_code(), exit_codes::USER_ERROR);
        assert_eq!(
            err.to_string(),
            "Failed to start scheduler: Resource temporarily unavailable"
        );
    }

    #[test]
    fn task_failed_has_correct_exit_code() {
        let err = SchedLockError::TaskFailed("exit status 1".to_string());
        assert_eq!(err.exit_code(), exit_codes::TASK_FAILURE);
    }

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = SchedLockError::UserError("unknown task".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn sqlite_errors_map_to_unavailable() {
        let err: SchedLockError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, SchedLockError::LockUnavailable(_)));
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err =
            SchedLockError::ConfigInvalid("lock_at_least_for exceeds lock_at_most_for".into());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: lock_at_least_for exceeds lock_at_most_for"
        );

        let err = SchedLockError::UserError("unknown task 'x'".to_string());
        assert_eq!(err.to_string(), "unknown task 'x'");
    }
}
