//! Opening the configured store, and read-only lock listing.

use super::memory::InMemoryLockStore;
use super::sqlite::SqliteLockStore;
use super::store::LockStore;
use super::types::LockInfo;
use crate::config::{StoreConfig, StoreKind};
use crate::error::{Result, SchedLockError};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Open the lock store described by the configuration.
///
/// # Returns
///
/// * `Ok(Arc<dyn LockStore>)` - Ready-to-use store
/// * `Err(SchedLockError::LockUnavailable)` - The database could not be opened
/// * `Err(SchedLockError::ConfigInvalid)` - The table name is not an identifier
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn LockStore>> {
    match config.kind {
        StoreKind::Sqlite => Ok(Arc::new(SqliteLockStore::open(&config.path, &config.table)?)),
        StoreKind::Memory => Ok(Arc::new(InMemoryLockStore::new())),
    }
}

/// List every lock record with its state at `now`.
pub fn list_locks(store: &dyn LockStore, now: DateTime<Utc>) -> Result<Vec<LockInfo>> {
    Ok(store
        .list()?
        .into_iter()
        .map(|record| LockInfo::observe(record, now))
        .collect())
}

/// Look up a single lock record and its state at `now`.
///
/// # Returns
///
/// * `Ok(LockInfo)` - The record exists
/// * `Err(SchedLockError::UserError)` - No task has ever acquired this name
pub fn describe_lock(store: &dyn LockStore, name: &str, now: DateTime<Utc>) -> Result<LockInfo> {
    store
        .find(name)?
        .map(|record| LockInfo::observe(record, now))
        .ok_or_else(|| {
            SchedLockError::UserError(format!(
                "lock '{}' does not exist (it is created on first acquisition)",
                name
            ))
        })
}
