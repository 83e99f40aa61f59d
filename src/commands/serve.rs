//! Implementation of the `schedlock serve` command.
//!
//! `serve` starts one tick thread per configured task and blocks. Each tick
//! goes through the lock, so running `serve` with the same configuration on
//! every node of a fleet executes each tick once.

use super::build_executor;
use crate::cli::ServeArgs;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::duration::{format_duration, parse_duration};
use crate::error::{Result, SchedLockError};
use crate::scheduler::TaskRegistry;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tracing::info;

pub fn cmd_serve(config_path: &Path, args: ServeArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let registry = TaskRegistry::from_config(&config)?;
    if registry.is_empty() {
        return Err(SchedLockError::UserError(format!(
            "no tasks configured in '{}'\n\n\
             Add at least one entry under `tasks:` to schedule it.",
            config_path.display()
        )));
    }

    let run_for = args
        .run_for
        .as_deref()
        .map(|raw| {
            let duration = parse_duration(raw)?;
            duration.to_std().map(|std| (duration, std)).map_err(|_| {
                SchedLockError::UserError(format!("--for must not be negative: '{}'", raw))
            })
        })
        .transpose()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let executor = build_executor(&config, Arc::clone(&clock))?;

    eprintln!("schedlock serve started");
    eprintln!("  config: {}", config_path.display());
    eprintln!("  holder: {}", executor.manager().holder_id());
    eprintln!("  store:  {}", config.store.kind.as_str());
    for task in registry.tasks() {
        eprintln!("  task:   {} ({})", task.name(), task.cron);
    }
    eprintln!();

    let handle = registry.start(executor, clock)?;
    info!(tasks = ?handle.task_names(), "scheduler started");

    match run_for {
        Some((duration, wait)) => {
            thread::sleep(wait);
            info!(after = %format_duration(duration), "stopping scheduler");
            handle.shutdown();
        }
        // Runs until the process is terminated; locks held at that point
        // expire at their at-most deadline.
        None => handle.join(),
    }

    Ok(())
}
