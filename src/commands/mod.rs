//! Command implementations for schedlock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command loads and validates the configuration
//! first, so a bad task definition is reported before anything runs.

mod lock;
mod serve;

#[cfg(test)]
mod tests;

use crate::cli::{Command, LockAction, LockCommand, NextArgs, RunArgs};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::coordinator::{LockingTaskExecutor, TickOutcome};
use crate::duration::format_duration;
use crate::error::{Result, SchedLockError};
use crate::locks::{LockManager, open_store};
use crate::scheduler::{CronSchedule, TaskRegistry};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. Each command
/// is routed to its handler function.
pub fn dispatch(config_path: &Path, command: Command) -> Result<()> {
    match command {
        Command::Check => cmd_check(config_path),
        Command::Serve(args) => serve::cmd_serve(config_path, args),
        Command::Run(args) => cmd_run(config_path, args),
        Command::Next(args) => cmd_next(config_path, args),
        Command::Lock(lock_cmd) => dispatch_lock(config_path, lock_cmd),
    }
}

/// Dispatch lock subcommands.
fn dispatch_lock(config_path: &Path, lock_cmd: LockCommand) -> Result<()> {
    match lock_cmd.action {
        LockAction::List(args) => lock::cmd_lock_list(config_path, args),
        LockAction::Show(args) => lock::cmd_lock_show(config_path, args),
    }
}

/// Open the configured store and wrap it in a manager and executor for
/// this process.
fn build_executor(config: &Config, clock: Arc<dyn Clock>) -> Result<Arc<LockingTaskExecutor>> {
    let store = open_store(&config.store)?;
    let manager = LockManager::new(store, clock, config.holder_id());
    Ok(Arc::new(LockingTaskExecutor::new(Arc::new(manager))))
}

fn cmd_check(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let registry = TaskRegistry::from_config(&config)?;
    let now = Utc::now();

    println!("Configuration OK: {}", config_path.display());
    println!(
        "  store:  {} ({}, table {})",
        config.store.kind.as_str(),
        config.store.path.display(),
        config.store.table
    );
    println!("  holder: {}", config.holder_id());
    println!();

    if registry.is_empty() {
        println!("No tasks configured.");
        return Ok(());
    }

    println!("Tasks ({}):", registry.tasks().len());
    for task in registry.tasks() {
        println!();
        println!("  {}:", task.name());
        println!("    Cron:       {}", task.cron);
        println!(
            "    Lock:       at least {}, at most {}",
            format_duration(task.lock.lock_at_least_for()),
            format_duration(task.lock.lock_at_most_for())
        );
        match task.cron.next_after(now) {
            Some(next) => println!("    Next fire:  {}", next.to_rfc3339()),
            None => println!("    Next fire:  never"),
        }
    }

    Ok(())
}

fn cmd_run(config_path: &Path, args: RunArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let registry = TaskRegistry::from_config(&config)?;
    let executor = build_executor(&config, Arc::new(SystemClock))?;

    match registry.run_once(&args.task, &executor)? {
        TickOutcome::Completed => {
            println!("Task '{}' completed.", args.task);
            Ok(())
        }
        TickOutcome::Skipped => {
            let store = executor.manager().store();
            match store.find(&args.task) {
                Ok(Some(record)) if record.is_held(Utc::now()) => println!(
                    "Task '{}' skipped: lock held by {} until {}.",
                    args.task,
                    record.locked_by,
                    record.locked_until.to_rfc3339()
                ),
                _ => println!("Task '{}' skipped: lock not acquired.", args.task),
            }
            Ok(())
        }
        TickOutcome::Failed(message) => Err(SchedLockError::TaskFailed(format!(
            "task '{}': {}",
            args.task, message
        ))),
    }
}

fn cmd_next(config_path: &Path, args: NextArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let task = config.find_task(&args.task).ok_or_else(|| {
        SchedLockError::UserError(format!(
            "unknown task '{}' (not defined in {})",
            args.task,
            config_path.display()
        ))
    })?;

    let cron = CronSchedule::parse(&task.cron)?;
    let upcoming = cron.upcoming(Utc::now(), args.count);
    if upcoming.is_empty() {
        println!("Task '{}' ({}) never fires.", task.name, cron);
        return Ok(());
    }

    println!("Next fire times for '{}' ({}):", task.name, cron);
    for at in upcoming {
        println!("  {}", at.to_rfc3339());
    }
    Ok(())
}
