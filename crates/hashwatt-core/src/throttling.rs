use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Local request budget for a quota-metered provider.
///
/// Checked before each outbound call so a burst of cache misses across many
/// day windows cannot drain a paid quota.
#[derive(Clone)]
pub struct QuotaLimiter {
    limiter: Arc<DirectRateLimiter>,
    refill: Duration,
}

impl QuotaLimiter {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        let (quota, refill) = quota_from_window(quota_window, quota_limit);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            refill,
        }
    }

    /// Budget for the Hashrate Index API.
    pub fn luxor_default() -> Self {
        Self::new(Duration::from_secs(3_600), 120)
    }

    /// Takes one unit of budget, or returns the refill interval to wait.
    pub fn acquire(&self) -> Result<(), Duration> {
        self.limiter.check().map_err(|_| self.refill)
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> (Quota, Duration) {
    let burst = NonZeroU32::new(quota_limit.max(1)).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(burst);
    (quota, period)
}
