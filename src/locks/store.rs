//! The lock store port.

use super::types::LockRecord;
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Durable table of named locks.
///
/// Implementations must make `try_acquire` a single atomic conditional
/// write: a read followed by a separate write loses updates when two nodes
/// race. `try_acquire` and `release` are the only mutating operations.
pub trait LockStore: Send + Sync {
    /// Take the lock if no record exists or the existing one has expired
    /// (`locked_until <= now`), setting `locked_at = now`,
    /// `locked_until = lock_until` and `locked_by = holder`.
    ///
    /// Returns `Ok(true)` iff the caller became the holder.
    fn try_acquire(
        &self,
        name: &str,
        now: DateTime<Utc>,
        lock_until: DateTime<Utc>,
        holder: &str,
    ) -> Result<bool>;

    /// Set `locked_until` of an existing record.
    ///
    /// Called by the current holder to shorten its lock once work is done.
    fn release(&self, name: &str, locked_until: DateTime<Utc>) -> Result<()>;

    /// Read one record.
    fn find(&self, name: &str) -> Result<Option<LockRecord>>;

    /// Read all records, sorted by name.
    fn list(&self) -> Result<Vec<LockRecord>>;
}
