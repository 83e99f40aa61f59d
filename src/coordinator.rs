//! Runs one scheduled tick of a task under its lock.
//!
//! Per tick: acquire → (skip | run → release). A skipped tick is routine
//! contention and surfaces nothing; a failed task is reported but its lock
//! is still released.

use crate::locks::{LockConfiguration, LockManager};
use crate::task::GuardedTask;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What happened on one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another holder had the lock (or the store was unreachable).
    Skipped,
    /// The task ran and returned successfully.
    Completed,
    /// The task ran and returned an error or panicked.
    Failed(String),
}

/// Wraps task execution with lock acquisition and guaranteed release.
pub struct LockingTaskExecutor {
    manager: Arc<LockManager>,
}

impl LockingTaskExecutor {
    pub fn new(manager: Arc<LockManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &LockManager {
        &self.manager
    }

    /// Run `task` iff the lock in `config` can be acquired.
    ///
    /// The lock is closed on every path out of the task: normal return,
    /// returned error, or panic. Nothing propagates to the caller except the
    /// outcome.
    pub fn execute(&self, config: &LockConfiguration, task: &dyn GuardedTask) -> TickOutcome {
        let Some(guard) = self.manager.acquire(config) else {
            debug!(task = %config.name(), "tick skipped; lock not acquired");
            return TickOutcome::Skipped;
        };

        info!(
            task = %config.name(),
            holder = %self.manager.holder_id(),
            acquired_at = %guard.acquired_at().to_rfc3339(),
            "task started"
        );
        let result = panic::catch_unwind(AssertUnwindSafe(|| task.run()));

        if let Err(e) = guard.close() {
            warn!(task = %config.name(), error = %e, "lock will expire at its at-most deadline");
        }

        match result {
            Ok(Ok(())) => {
                info!(task = %config.name(), "task completed");
                TickOutcome::Completed
            }
            Ok(Err(e)) => {
                let message = format!("{:#}", e);
                error!(task = %config.name(), error = %message, "task failed");
                TickOutcome::Failed(message)
            }
            Err(payload) => {
                let message = format!("panicked: {}", panic_message(payload.as_ref()));
                error!(task = %config.name(), error = %message, "task failed");
                TickOutcome::Failed(message)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
