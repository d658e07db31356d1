use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use time::OffsetDateTime;

/// Wall-clock source for cache ages and history cutoffs.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    fn now_secs(&self) -> i64 {
        self.now_millis().div_euclid(1_000)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let now = OffsetDateTime::now_utc();
        (now.unix_timestamp_nanos() / 1_000_000) as i64
    }
}

/// Settable clock for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(epoch_secs: i64) -> Self {
        Self {
            millis: AtomicI64::new(epoch_secs * 1_000),
        }
    }

    pub fn advance(&self, by: Duration) {
        let delta = by.as_millis().min(i64::MAX as u128) as i64;
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn set_secs(&self, epoch_secs: i64) {
        self.millis.store(epoch_secs * 1_000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}
