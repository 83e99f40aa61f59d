//! Acquire protocol on top of a [`LockStore`].

use super::guard::LockGuard;
use super::store::LockStore;
use super::types::LockConfiguration;
use crate::clock::Clock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Computes lock windows and performs the atomic acquire.
///
/// Store failures never escape: an unreachable store means "not acquired",
/// so a guarded task never runs without the lock.
pub struct LockManager {
    store: Arc<dyn LockStore>,
    clock: Arc<dyn Clock>,
    holder_id: String,
}

impl LockManager {
    pub fn new(
        store: Arc<dyn LockStore>,
        clock: Arc<dyn Clock>,
        holder_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            holder_id: holder_id.into(),
        }
    }

    pub fn holder_id(&self) -> &str {
        &self.holder_id
    }

    pub fn store(&self) -> &Arc<dyn LockStore> {
        &self.store
    }

    /// Try to take the lock described by `config` until `now + lock_at_most_for`.
    ///
    /// Returns `None` when another holder has an unexpired lock, or when the
    /// store fails. The caller must not run the guarded work in that case.
    pub fn acquire(&self, config: &LockConfiguration) -> Option<LockGuard> {
        let name = config.name();
        let now = self.clock.now();
        let Some(lock_until) = now.checked_add_signed(config.lock_at_most_for()) else {
            warn!(lock = %name, "lock_at_most_for overflows the clock; not acquiring");
            return None;
        };

        match self.store.try_acquire(name, now, lock_until, &self.holder_id) {
            Ok(true) => {
                debug!(
                    lock = %name,
                    holder = %self.holder_id,
                    until = %lock_until.to_rfc3339(),
                    "lock acquired"
                );
                Some(LockGuard::new(
                    Arc::clone(&self.store),
                    Arc::clone(&self.clock),
                    name.to_string(),
                    now,
                    config.lock_at_least_for(),
                ))
            }
            Ok(false) => {
                debug!(lock = %name, "lock held elsewhere");
                None
            }
            Err(e) => {
                warn!(
                    lock = %name,
                    error = %e,
                    "lock store unavailable; treating lock as not acquired"
                );
                None
            }
        }
    }
}
