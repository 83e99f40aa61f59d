//! Holder identity recorded in `locked_by`.

/// Default holder identity for this process: `user@host:pid`.
///
/// Only used for diagnostics, so collisions between processes are harmless.
pub fn default_holder_id() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}:{}", user, host, std::process::id())
}
