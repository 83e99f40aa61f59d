//! Cron-driven scheduling of lock-guarded tasks.
//!
//! - `cron`: six-field cron expressions and next-fire computation
//! - `runner`: one tick thread per task, shutdown and join
//! - `registry`: startup registration with fail-fast validation

mod cron;
mod registry;
mod runner;


pub use cron::CronSchedule;
pub use registry::{RegisteredTask, TaskRegistry};
pub use runner::{ScheduledJob, SchedulerHandle, TaskSchedule, Tick};
