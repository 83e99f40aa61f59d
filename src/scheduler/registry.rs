//! Startup registration of scheduled, lock-guarded tasks.
//!
//! Everything that can be wrong with a task definition (cron syntax,
//! durations, `at_least > at_most`, duplicate names) is rejected here,
//! before any thread starts.

use super::cron::CronSchedule;
use super::runner::{ScheduledJob, SchedulerHandle};
use crate::clock::Clock;
use crate::config::Config;
use crate::coordinator::{LockingTaskExecutor, TickOutcome};
use crate::error::{Result, SchedLockError};
use crate::locks::LockConfiguration;
use crate::task::GuardedTask;
use std::sync::Arc;

/// A task bound to its cadence and lock.
#[derive(Clone)]
pub struct RegisteredTask {
    pub lock: LockConfiguration,
    pub cron: CronSchedule,
    pub task: Arc<dyn GuardedTask>,
}

impl RegisteredTask {
    pub fn name(&self) -> &str {
        self.lock.name()
    }
}

/// The set of tasks this process schedules.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Vec<RegisteredTask>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `task` to run on `cron_spec`, guarded by a lock named `name`
    /// held for at most `at_most` and at least `at_least`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// registry.register_scheduled_locked_task(
    ///     "shortRunningTask",
    ///     "0 */2 * * * *",
    ///     "5m",
    ///     "1m",
    ///     || -> anyhow::Result<()> { Ok(()) },
    /// )?;
    /// ```
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Task registered
    /// * `Err(SchedLockError::ConfigInvalid)` - Malformed cron or durations,
    ///   `at_least > at_most`, or a name that is already registered
    pub fn register_scheduled_locked_task<T>(
        &mut self,
        name: &str,
        cron_spec: &str,
        at_most: &str,
        at_least: &str,
        task: T,
    ) -> Result<()>
    where
        T: GuardedTask + 'static,
    {
        let cron = CronSchedule::parse(cron_spec)?;
        let lock = LockConfiguration::parse(name, at_most, at_least)?;
        self.register(RegisteredTask {
            lock,
            cron,
            task: Arc::new(task),
        })
    }

    /// Register an already-validated task.
    pub fn register(&mut self, task: RegisteredTask) -> Result<()> {
        if self.get(task.name()).is_some() {
            return Err(SchedLockError::ConfigInvalid(format!(
                "task '{}' is registered twice",
                task.name()
            )));
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Register every task defined in the configuration file.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        for task in &config.tasks {
            registry.register_scheduled_locked_task(
                &task.name,
                &task.cron,
                config.lock_at_most_for(task),
                &task.lock_at_least_for,
                task.shell_task()?,
            )?;
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTask> {
        self.tasks.iter().find(|t| t.name() == name)
    }

    pub fn tasks(&self) -> &[RegisteredTask] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run one tick of the named task right now, through the lock.
    pub fn run_once(&self, name: &str, executor: &LockingTaskExecutor) -> Result<TickOutcome> {
        let task = self
            .get(name)
            .ok_or_else(|| SchedLockError::UserError(format!("unknown task '{}'", name)))?;
        Ok(executor.execute(&task.lock, task.task.as_ref()))
    }

    /// Start one tick thread per registered task.
    pub fn start(
        self,
        executor: Arc<LockingTaskExecutor>,
        clock: Arc<dyn Clock>,
    ) -> Result<SchedulerHandle> {
        let jobs = self
            .tasks
            .into_iter()
            .map(|registered| {
                let executor = Arc::clone(&executor);
                let RegisteredTask { lock, cron, task } = registered;
                ScheduledJob {
                    name: lock.name().to_string(),
                    cron,
                    tick: Box::new(move || {
                        executor.execute(&lock, task.as_ref());
                    }),
                }
            })
            .collect();

        SchedulerHandle::spawn(jobs, clock).map_err(|e| {
            SchedLockError::SchedulerFailed(format!("could not spawn tick thread: {}", e))
        })
    }
}
