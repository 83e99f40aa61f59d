//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for one schedlock process.
///
/// Loaded once at startup and passed by reference; there is no global
/// registry. Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Identity
    // =========================================================================
    /// Value written to `locked_by`. Defaults to `user@host:pid`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_id: Option<String>,

    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Ceiling used by tasks that do not set `lock_at_most_for`.
    #[serde(default = "default_lock_at_most_for")]
    pub default_lock_at_most_for: String,

    /// Lock store settings.
    #[serde(default)]
    pub store: StoreConfig,

    // =========================================================================
    // Tasks
    // =========================================================================
    /// Scheduled tasks, each guarded by a lock of the same name.
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            holder_id: None,
            default_lock_at_most_for: default_lock_at_most_for(),
            store: StoreConfig::default(),
            tasks: Vec::new(),
        }
    }
}
