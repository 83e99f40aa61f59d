//! RAII handle for an acquired lock.

use super::store::LockStore;
use crate::clock::Clock;
use crate::duration::format_duration;
use crate::error::{Result, SchedLockError};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Proof that this process holds a named lock.
///
/// Closing shortens the lock to `max(now, acquired_at + lock_at_least_for)`.
/// Closing happens exactly once: either explicitly through [`LockGuard::close`],
/// or on drop for a guard that was never closed (including while unwinding
/// from a panic). A failed release is logged, never panicked on; the lock
/// then simply expires at its at-most deadline.
pub struct LockGuard {
    store: Arc<dyn LockStore>,
    clock: Arc<dyn Clock>,
    name: String,
    acquired_at: DateTime<Utc>,
    lock_at_least_for: Duration,

    /// Whether the lock has been closed already.
    released: bool,
}

impl LockGuard {
    pub(super) fn new(
        store: Arc<dyn LockStore>,
        clock: Arc<dyn Clock>,
        name: String,
        acquired_at: DateTime<Utc>,
        lock_at_least_for: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            name,
            acquired_at,
            lock_at_least_for,
            released: false,
        }
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// The expiry a close at `now` would write.
    pub fn release_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.max(self.acquired_at + self.lock_at_least_for)
    }

    /// Close the lock now and report the expiry that was written.
    ///
    /// # Returns
    ///
    /// * `Ok(DateTime)` - The new `locked_until`
    /// * `Err(SchedLockError::ReleaseFailed)` - The store rejected the write;
    ///   the lock stays held until its at-most deadline
    pub fn close(mut self) -> Result<DateTime<Utc>> {
        self.released = true;
        self.unlock()
    }

    fn unlock(&self) -> Result<DateTime<Utc>> {
        let release_at = self.release_at(self.clock.now());
        self.store.release(&self.name, release_at).map_err(|e| {
            SchedLockError::ReleaseFailed(format!("lock '{}': {}", self.name, e))
        })?;
        debug!(
            lock = %self.name,
            until = %release_at.to_rfc3339(),
            held_for = %format_duration(release_at - self.acquired_at),
            "lock released"
        );
        Ok(release_at)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            if let Err(e) = self.unlock() {
                warn!(lock = %self.name, error = %e, "failed to release lock on drop");
            }
        }
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("name", &self.name)
            .field("acquired_at", &self.acquired_at)
            .field("lock_at_least_for", &self.lock_at_least_for)
            .field("released", &self.released)
            .finish()
    }
}
