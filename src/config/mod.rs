//! Configuration model for schedlock.
//!
//! This module defines the Config struct that represents `schedlock.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and fail-fast validation of every
//! task definition.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::{StoreConfig, StoreKind, TaskConfig};
