//! CLI argument parsing for schedlock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Upper bound for `next -n`.
const MAX_NEXT_COUNT: u64 = 1000;

/// schedlock: run cron-scheduled tasks on at most one node of a fleet.
///
/// Every node runs the same schedule; a shared lock table decides which
/// node executes each tick:
/// - a lock is held until `lock_at_most_for` even if its holder crashes
/// - a finished task keeps its lock for at least `lock_at_least_for`
#[derive(Parser, Debug)]
#[command(name = "schedlock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, short = 'c', global = true, default_value = "schedlock.yaml")]
    pub config: PathBuf,

    /// Log filter, e.g. `info` or `schedlock=debug`.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for schedlock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the configuration.
    ///
    /// Prints each task with its lock window and next fire time.
    Check,

    /// Run the scheduler.
    ///
    /// Registers every configured task and fires it on its cron cadence,
    /// running a tick only when this node wins the task's lock.
    Serve(ServeArgs),

    /// Fire one tick of a task now.
    ///
    /// Honours the lock exactly like a scheduled tick: if another node holds
    /// it, the task is skipped.
    Run(RunArgs),

    /// Show upcoming fire times of a task.
    Next(NextArgs),

    /// Lock table inspection.
    ///
    /// Read-only: locks are only ever written by acquire and release.
    Lock(LockCommand),
}

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Stop gracefully after this long (e.g. `90s`, `1h`). Runs until
    /// interrupted when omitted.
    #[arg(long = "for", value_name = "DURATION")]
    pub run_for: Option<String>,
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Task name as configured.
    pub task: String,
}

/// Arguments for the `next` command.
#[derive(Args, Debug)]
pub struct NextArgs {
    /// Task name as configured.
    pub task: String,

    /// Number of fire times to show (1-1000).
    #[arg(
        short = 'n',
        long,
        default_value_t = 5,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_NEXT_COUNT)
    )]
    pub count: usize,
}

/// Lock subcommands.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// List every lock record with its held/expired state.
    List(LockListArgs),

    /// Show one lock record.
    Show(LockShowArgs),
}

/// Arguments for the `lock list` command.
#[derive(Args, Debug)]
pub struct LockListArgs {
    /// Print records as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `lock show` command.
#[derive(Args, Debug)]
pub struct LockShowArgs {
    /// Lock (task) name.
    pub name: String,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
