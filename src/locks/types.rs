//! Lock record, lock configuration, and lock information structures.

use crate::duration::{format_duration, parse_duration};
use crate::error::{Result, SchedLockError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One row of the lock table.
///
/// A record is created on the first successful acquisition of its name and
/// then mutated in place on every acquire/release cycle; it is never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Name of the guarded task (primary key).
    pub name: String,

    /// The lock is held iff this is strictly after "now".
    pub locked_until: DateTime<Utc>,

    /// When the current (or last) holder acquired the lock.
    pub locked_at: DateTime<Utc>,

    /// Holder identity. Diagnostics only; never used for correctness.
    pub locked_by: String,
}

impl LockRecord {
    /// Whether the lock is held at `now`.
    pub fn is_held(&self, now: DateTime<Utc>) -> bool {
        self.locked_until > now
    }

    /// Whether a new holder may take the lock at `now`.
    pub fn is_stealable(&self, now: DateTime<Utc>) -> bool {
        !self.is_held(now)
    }
}

/// Lock bounds for one guarded task.
///
/// `lock_at_most_for` bounds how long a crashed holder can keep the lock;
/// `lock_at_least_for` is the minimum hold after acquisition, so a task that
/// finishes quickly cannot be re-run by another node for the same interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfiguration {
    name: String,
    lock_at_most_for: Duration,
    lock_at_least_for: Duration,
}

impl LockConfiguration {
    /// Build a lock configuration, rejecting invalid bounds.
    ///
    /// # Returns
    ///
    /// * `Ok(LockConfiguration)` - Valid configuration
    /// * `Err(SchedLockError::ConfigInvalid)` - Empty name, non-positive
    ///   `at_most`, negative `at_least`, or `at_least > at_most`
    pub fn new(
        name: impl Into<String>,
        lock_at_most_for: Duration,
        lock_at_least_for: Duration,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SchedLockError::ConfigInvalid(
                "lock name must not be empty".to_string(),
            ));
        }
        if lock_at_most_for <= Duration::zero() {
            return Err(SchedLockError::ConfigInvalid(format!(
                "lock '{}': lock_at_most_for must be greater than 0",
                name
            )));
        }
        if lock_at_least_for < Duration::zero() {
            return Err(SchedLockError::ConfigInvalid(format!(
                "lock '{}': lock_at_least_for must not be negative",
                name
            )));
        }
        if lock_at_least_for > lock_at_most_for {
            return Err(SchedLockError::ConfigInvalid(format!(
                "lock '{}': lock_at_least_for ({}) must not exceed lock_at_most_for ({})",
                name,
                format_duration(lock_at_least_for),
                format_duration(lock_at_most_for)
            )));
        }

        Ok(Self {
            name,
            lock_at_most_for,
            lock_at_least_for,
        })
    }

    /// Build a lock configuration from human-readable durations such as `"5m"`.
    pub fn parse(name: impl Into<String>, at_most: &str, at_least: &str) -> Result<Self> {
        let name = name.into();
        let at_most =
            parse_duration(at_most).map_err(|e| with_field(&name, "lock_at_most_for", e))?;
        let at_least =
            parse_duration(at_least).map_err(|e| with_field(&name, "lock_at_least_for", e))?;
        Self::new(name, at_most, at_least)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lock_at_most_for(&self) -> Duration {
        self.lock_at_most_for
    }

    pub fn lock_at_least_for(&self) -> Duration {
        self.lock_at_least_for
    }
}

fn with_field(name: &str, field: &str, err: SchedLockError) -> SchedLockError {
    match err {
        SchedLockError::ConfigInvalid(msg) => {
            SchedLockError::ConfigInvalid(format!("lock '{}': {}: {}", name, field, msg))
        }
        other => other,
    }
}

/// A lock record as seen at a particular instant.
#[derive(Debug, Clone, Serialize)]
pub struct LockInfo {
    #[serde(flatten)]
    pub record: LockRecord,

    /// Whether the lock was held when observed.
    pub held: bool,

    /// Time left until the lock expires (zero if expired).
    #[serde(skip)]
    pub remaining: Duration,
}

impl LockInfo {
    pub fn observe(record: LockRecord, now: DateTime<Utc>) -> Self {
        let held = record.is_held(now);
        let remaining = if held {
            record.locked_until - now
        } else {
            Duration::zero()
        };
        Self {
            record,
            held,
            remaining,
        }
    }
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (holder: {}, locked at: {}, until: {}, {})",
            self.record.name,
            self.record.locked_by,
            self.record.locked_at.to_rfc3339(),
            self.record.locked_until.to_rfc3339(),
            if self.held {
                format!("HELD, {} left", format_duration(self.remaining))
            } else {
                "free".to_string()
            }
        )
    }
}
