//! Configuration types and defaults for schedlock.
//!
//! This module defines enums, nested sections, and default value functions
//! used by the Config struct.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Which lock store backs the lock table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// SQLite database file, shared by every process that opens it (default).
    #[default]
    Sqlite,
    /// Process-local table; only coordinates tasks within one process.
    Memory,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Sqlite => "sqlite",
            StoreKind::Memory => "memory",
        }
    }
}

/// Lock store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store backend.
    pub kind: StoreKind,

    /// Database file for the `sqlite` backend.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Lock table name (default: "shedlock").
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: default_store_path(),
            table: default_table(),
        }
    }
}

/// One scheduled, lock-guarded task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Task name; also the lock name.
    pub name: String,

    /// Six-field cron expression (second minute hour day-of-month month day-of-week).
    pub cron: String,

    /// Lock ceiling. Falls back to `default_lock_at_most_for` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_at_most_for: Option<String>,

    /// Minimum hold after acquisition (default: "0s").
    #[serde(default = "default_lock_at_least_for")]
    pub lock_at_least_for: String,

    /// Command line to run on each tick.
    pub command: String,

    /// Working directory for the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Extra environment variables for the command.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

pub fn default_lock_at_most_for() -> String {
    "10m".to_string()
}

pub fn default_lock_at_least_for() -> String {
    "0s".to_string()
}

pub fn default_store_path() -> PathBuf {
    PathBuf::from("schedlock.db")
}

pub fn default_table() -> String {
    crate::locks::DEFAULT_TABLE.to_string()
}
