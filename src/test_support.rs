use crate::clock::Clock;
use crate::error::{Result, SchedLockError};
use crate::locks::{LockRecord, LockStore};
use crate::task::GuardedTask;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed start instant shared by deterministic tests.
pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

pub(crate) fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(t0()))
}

/// A clock that only moves when told to.
///
/// Shared between several managers it stands in for a fleet whose nodes
/// agree on the time.
#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward (or backward, for a negative delta).
    pub(crate) fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }

    pub(crate) fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Task body that counts its invocations and then succeeds, fails or panics.
pub(crate) struct CountingTask {
    calls: AtomicUsize,
    behaviour: Behaviour,
}

#[derive(Clone, Copy)]
enum Behaviour {
    Succeed,
    Fail,
    Panic,
}

impl CountingTask {
    pub(crate) fn succeeding() -> Self {
        Self::with(Behaviour::Succeed)
    }

    pub(crate) fn failing() -> Self {
        Self::with(Behaviour::Fail)
    }

    pub(crate) fn panicking() -> Self {
        Self::with(Behaviour::Panic)
    }

    fn with(behaviour: Behaviour) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            behaviour,
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GuardedTask for CountingTask {
    fn run(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => anyhow::bail!("boom"),
            Behaviour::Panic => panic!("task exploded"),
        }
    }
}

/// Store whose every call fails, as if the database were unreachable.
pub(crate) struct UnavailableStore;

impl UnavailableStore {
    fn down<T>() -> Result<T> {
        Err(SchedLockError::LockUnavailable("connection refused".to_string()))
    }
}

impl LockStore for UnavailableStore {
    fn try_acquire(&self, _: &str, _: DateTime<Utc>, _: DateTime<Utc>, _: &str) -> Result<bool> {
        Self::down()
    }

    fn release(&self, _: &str, _: DateTime<Utc>) -> Result<()> {
        Self::down()
    }

    fn find(&self, _: &str) -> Result<Option<LockRecord>> {
        Self::down()
    }

    fn list(&self) -> Result<Vec<LockRecord>> {
        Self::down()
    }
}

/// Delegating store that counts acquisitions and releases.
pub(crate) struct CountingStore<S> {
    inner: S,
    acquired: AtomicUsize,
    releases: AtomicUsize,
}

impl<S: LockStore> CountingStore<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self {
            inner,
            acquired: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        }
    }

    /// Successful acquisitions only.
    pub(crate) fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub(crate) fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl<S: LockStore> LockStore for CountingStore<S> {
    fn try_acquire(
        &self,
        name: &str,
        now: DateTime<Utc>,
        lock_until: DateTime<Utc>,
        holder: &str,
    ) -> Result<bool> {
        let won = self.inner.try_acquire(name, now, lock_until, holder)?;
        if won {
            self.acquired.fetch_add(1, Ordering::SeqCst);
        }
        Ok(won)
    }

    fn release(&self, name: &str, locked_until: DateTime<Utc>) -> Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.inner.release(name, locked_until)
    }

    fn find(&self, name: &str) -> Result<Option<LockRecord>> {
        self.inner.find(name)
    }

    fn list(&self) -> Result<Vec<LockRecord>> {
        self.inner.list()
    }
}

#[test]
fn manual_clock_moves_only_when_told() {
    let clock = manual_clock();
    assert_eq!(clock.now(), t0());

    clock.advance(Duration::seconds(90));
    assert_eq!(clock.now(), t0() + Duration::seconds(90));

    clock.set(t0());
    assert_eq!(clock.now(), t0());
}
