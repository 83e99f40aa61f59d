//! Exit code constants for the schedlock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, unknown task)
//! - 2: Invalid configuration
//! - 3: Lock store failure
//! - 4: Guarded task failure
//! - 5: Runtime failure (scheduler threads could not start)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or a reference to something that does not exist.
pub const USER_ERROR: i32 = 1;

/// Configuration rejected at load time.
pub const CONFIG_INVALID: i32 = 2;

/// Lock store could not be opened, read, or written.
pub const STORE_FAILURE: i32 = 3;

/// A task run through `schedlock run` failed.
pub const TASK_FAILURE: i32 = 4;

/// The process itself failed, e.g. the OS refused to spawn a thread.
pub const RUNTIME_FAILURE: i32 = 5;
