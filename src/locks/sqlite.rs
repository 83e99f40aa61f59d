//! SQLite-backed lock table, shareable by every process that can open the
//! same database file.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE shedlock (
//!     name       TEXT    NOT NULL PRIMARY KEY,
//!     lock_until INTEGER NOT NULL,  -- UTC epoch milliseconds
//!     locked_at  INTEGER NOT NULL,  -- UTC epoch milliseconds
//!     locked_by  TEXT    NOT NULL
//! );
//! ```
//!
//! Acquisition is one upsert statement whose update branch only applies to
//! an expired row, so SQLite's write lock makes the compare-and-set atomic
//! across connections and processes.
//!
//! Columns hold whole milliseconds. `lock_until` is rounded up and
//! `locked_at` down, so a stored lock never expires earlier than requested.

use super::store::LockStore;
use super::types::LockRecord;
use crate::error::{Result, SchedLockError};
use chrono::{DateTime, Utc};
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{LazyLock, Mutex, MutexGuard};
use std::time::Duration;

/// Default lock table name.
pub const DEFAULT_TABLE: &str = "shedlock";

/// How long a statement waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static TABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid table name regex"));

pub struct SqliteLockStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteLockStore {
    /// Open (creating if needed) the database at `path` and ensure the lock
    /// table exists.
    pub fn open<P: AsRef<Path>>(path: P, table: &str) -> Result<Self> {
        validate_table_name(table)?;
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            SchedLockError::LockUnavailable(format!(
                "failed to open lock database '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::with_connection(conn, table)
    }

    /// A private in-memory database. Useful for tests only, since no other
    /// connection can see it.
    #[cfg(test)]
    pub fn open_in_memory(table: &str) -> Result<Self> {
        validate_table_name(table)?;
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                 name       TEXT    NOT NULL PRIMARY KEY,
                 lock_until INTEGER NOT NULL,
                 locked_at  INTEGER NOT NULL,
                 locked_by  TEXT    NOT NULL
             );"
        ))?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SchedLockError::LockUnavailable("sqlite connection lock poisoned".into()))
    }
}

impl LockStore for SqliteLockStore {
    fn try_acquire(
        &self,
        name: &str,
        now: DateTime<Utc>,
        lock_until: DateTime<Utc>,
        holder: &str,
    ) -> Result<bool> {
        let table = &self.table;
        let changed = self.conn()?.execute(
            &format!(
                "INSERT INTO {table} (name, lock_until, locked_at, locked_by)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name) DO UPDATE SET
                     lock_until = excluded.lock_until,
                     locked_at = excluded.locked_at,
                     locked_by = excluded.locked_by
                 WHERE {table}.lock_until <= excluded.locked_at"
            ),
            params![
                name,
                ceil_millis(lock_until),
                now.timestamp_millis(),
                holder
            ],
        )?;
        Ok(changed == 1)
    }

    fn release(&self, name: &str, locked_until: DateTime<Utc>) -> Result<()> {
        let table = &self.table;
        self.conn()?.execute(
            &format!("UPDATE {table} SET lock_until = ?2 WHERE name = ?1"),
            params![name, ceil_millis(locked_until)],
        )?;
        Ok(())
    }

    fn find(&self, name: &str) -> Result<Option<LockRecord>> {
        let table = &self.table;
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT name, lock_until, locked_at, locked_by FROM {table} WHERE name = ?1"
                ),
                params![name],
                read_row,
            )
            .optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    fn list(&self) -> Result<Vec<LockRecord>> {
        let table = &self.table;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT name, lock_until, locked_at, locked_by FROM {table} ORDER BY name"
        ))?;
        let rows = stmt.query_map([], read_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }
}

fn ceil_millis(instant: DateTime<Utc>) -> i64 {
    let millis = instant.timestamp_millis();
    if instant.timestamp_subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis + 1
    }
}

/// Check that `table` is a plain SQL identifier, since it is spliced into
/// statements.
pub fn validate_table_name(table: &str) -> Result<()> {
    if TABLE_NAME.is_match(table) {
        Ok(())
    } else {
        Err(SchedLockError::ConfigInvalid(format!(
            "lock table name '{}' must be a plain identifier (letters, digits, underscore)",
            table
        )))
    }
}

struct RawRecord {
    name: String,
    lock_until: i64,
    locked_at: i64,
    locked_by: String,
}

impl RawRecord {
    fn into_record(self) -> Result<LockRecord> {
        let timestamp = |millis: i64| {
            DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                SchedLockError::LockUnavailable(format!(
                    "lock '{}' has an out-of-range timestamp {}",
                    self.name, millis
                ))
            })
        };
        Ok(LockRecord {
            locked_until: timestamp(self.lock_until)?,
            locked_at: timestamp(self.locked_at)?,
            name: self.name,
            locked_by: self.locked_by,
        })
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        name: row.get(0)?,
        lock_until: row.get(1)?,
        locked_at: row.get(2)?,
        locked_by: row.get(3)?,
    })
}
