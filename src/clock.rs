//! Time source abstraction.
//!
//! Every lock window is computed from a `Clock`, never from `Utc::now()`
//! directly, so expiry behaviour can be driven deterministically in tests.

use chrono::{DateTime, Utc};

/// Provides the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
