//! In-process lock table.
//!
//! Shared by every manager in one process (threads, or a simulated fleet in
//! tests). Provides no coordination between processes.

use super::store::LockStore;
use super::types::LockRecord;
use crate::error::{Result, SchedLockError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct InMemoryLockStore {
    records: Mutex<HashMap<String, LockRecord>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, HashMap<String, LockRecord>>> {
        self.records
            .lock()
            .map_err(|_| SchedLockError::LockUnavailable("in-memory lock table poisoned".into()))
    }
}

impl LockStore for InMemoryLockStore {
    fn try_acquire(
        &self,
        name: &str,
        now: DateTime<Utc>,
        lock_until: DateTime<Utc>,
        holder: &str,
    ) -> Result<bool> {
        // Check and write under the same guard.
        let mut records = self.records()?;
        if !records.get(name).is_none_or(|r| r.is_stealable(now)) {
            return Ok(false);
        }
        records.insert(
            name.to_string(),
            LockRecord {
                name: name.to_string(),
                locked_until: lock_until,
                locked_at: now,
                locked_by: holder.to_string(),
            },
        );
        Ok(true)
    }

    fn release(&self, name: &str, locked_until: DateTime<Utc>) -> Result<()> {
        if let Some(record) = self.records()?.get_mut(name) {
            record.locked_until = locked_until;
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Result<Option<LockRecord>> {
        Ok(self.records()?.get(name).cloned())
    }

    fn list(&self) -> Result<Vec<LockRecord>> {
        let mut records: Vec<LockRecord> = self.records()?.values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }
}
