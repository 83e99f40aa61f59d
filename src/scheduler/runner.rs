//! Tick threads.
//!
//! Each scheduled task gets its own thread which sleeps until the next fire
//! time and then runs the tick synchronously. Because the next fire time is
//! computed from the clock *after* the tick returns, fire times that pass
//! while a tick runs (or while the process is down) are dropped, never
//! replayed, and a task never overlaps itself within one process.

use super::cron::CronSchedule;
use crate::clock::Clock;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Next-fire bookkeeping for one task.
#[derive(Debug, Clone)]
pub struct TaskSchedule {
    cron: CronSchedule,
    next_fire: Option<DateTime<Utc>>,
}

impl TaskSchedule {
    /// Start scheduling at `now`; the first fire is strictly after it.
    pub fn new(cron: CronSchedule, now: DateTime<Utc>) -> Self {
        let next_fire = cron.next_after(now);
        Self { cron, next_fire }
    }

    pub fn next_fire(&self) -> Option<DateTime<Utc>> {
        self.next_fire
    }

    /// Whether a tick is due at `now`.
    pub fn due(&self, now: DateTime<Utc>) -> bool {
        self.next_fire.is_some_and(|t| now >= t)
    }

    /// Skip to the first fire time strictly after `now`.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        self.next_fire = self.cron.next_after(now);
    }
}

/// Work performed on each tick.
pub type Tick = Box<dyn FnMut() + Send>;

/// A named cadence and its tick.
pub struct ScheduledJob {
    pub name: String,
    pub cron: CronSchedule,
    pub tick: Tick,
}

/// Running tick threads.
///
/// Dropping the handle without calling [`SchedulerHandle::shutdown`]
/// disconnects the shutdown channels, which also stops the threads.
pub struct SchedulerHandle {
    workers: Vec<Worker>,
}

struct Worker {
    name: String,
    shutdown_tx: Sender<()>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Spawn one tick thread per job.
    pub fn spawn(jobs: Vec<ScheduledJob>, clock: Arc<dyn Clock>) -> std::io::Result<Self> {
        let mut workers = Vec::with_capacity(jobs.len());
        for job in jobs {
            let (shutdown_tx, shutdown_rx) = mpsc::channel();
            let clock = Arc::clone(&clock);
            let name = job.name.clone();
            let join = thread::Builder::new()
                .name(format!("schedlock-{}", job.name))
                .spawn(move || tick_loop(job, clock, shutdown_rx))?;
            workers.push(Worker {
                name,
                shutdown_tx,
                join,
            });
        }
        Ok(Self { workers })
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.workers.iter().map(|w| w.name.as_str()).collect()
    }

    /// Ask every thread to stop and wait for them.
    ///
    /// A tick that is already running finishes first; there is no
    /// mid-task cancellation.
    pub fn shutdown(self) {
        for worker in &self.workers {
            // ignore send error: the thread may have exited already
            let _ = worker.shutdown_tx.send(());
        }
        self.join();
    }

    /// Wait for every thread to exit without asking them to stop.
    pub fn join(self) {
        for worker in self.workers {
            if worker.join.join().is_err() {
                warn!(task = %worker.name, "tick thread panicked");
            }
        }
    }
}

fn tick_loop(mut job: ScheduledJob, clock: Arc<dyn Clock>, shutdown_rx: mpsc::Receiver<()>) {
    let mut schedule = TaskSchedule::new(job.cron.clone(), clock.now());
    info!(
        task = %job.name,
        cron = %job.cron,
        next = ?schedule.next_fire().map(|t| t.to_rfc3339()),
        "scheduled"
    );

    loop {
        let Some(next) = schedule.next_fire() else {
            warn!(
                task = %job.name,
                cron = %job.cron,
                "cron expression has no future fire times; stopping"
            );
            break;
        };

        let wait = (next - clock.now()).to_std().unwrap_or(Duration::ZERO);
        match shutdown_rx.recv_timeout(wait) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = clock.now();
        if !schedule.due(now) {
            continue;
        }

        debug!(task = %job.name, fire_time = %next.to_rfc3339(), "tick");
        (job.tick)();
        schedule.advance(clock.now());
    }

    debug!(task = %job.name, "tick thread stopped");
}
