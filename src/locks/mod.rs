//! Locking subsystem for schedlock.
//!
//! This module implements the shared lock table that keeps a scheduled task
//! running on at most one node of a fleet at a time.
//!
//! # Lock Records
//!
//! One row per lock name holding `locked_until`, `locked_at` and
//! `locked_by`. A lock is held iff `locked_until` is strictly after the
//! current time; an expired row can be taken over by anyone.
//!
//! # Protocol
//!
//! - **Acquire**: one atomic conditional write that succeeds only if the
//!   row is absent or expired, setting `locked_until = now + lock_at_most_for`.
//! - **Release**: when the guarded work ends, `locked_until` is shortened to
//!   `max(now, locked_at + lock_at_least_for)`.
//!
//! A holder that crashes without releasing blocks others for at most
//! `lock_at_most_for`. A holder that finishes early still keeps the lock for
//! `lock_at_least_for`, so a node whose clock lags slightly cannot re-run
//! the same interval.
//!
//! # RAII Guards
//!
//! Acquired locks are represented by a [`LockGuard`] which releases on
//! `close()` or on drop, whichever comes first, exactly once.

mod guard;
mod holder;
mod manager;
mod memory;
mod operations;
mod sqlite;
mod store;
mod types;


// Re-export public API
pub use guard::LockGuard;
pub use holder::default_holder_id;
pub use manager::LockManager;
pub use memory::InMemoryLockStore;
pub use operations::{describe_lock, list_locks, open_store};
pub use sqlite::{DEFAULT_TABLE, SqliteLockStore, validate_table_name};
pub use store::LockStore;
pub use types::{LockConfiguration, LockInfo, LockRecord};
