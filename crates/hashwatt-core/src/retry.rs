//! Retry logic with exponential backoff and jitter.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::ValidationError;

/// Backoff strategy for retrying failed calls.
///
/// The delay before retry `attempt` (0-based) is
/// `base * factor^attempt + uniform(0, max_jitter)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// The initial backoff duration.
    pub base: Duration,
    /// The multiplicative factor for each subsequent retry.
    pub factor: f64,
    /// Upper bound (exclusive) of the random delay added to every wait.
    pub max_jitter: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            factor: 2.0,
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl Backoff {
    /// Deterministic part of the delay for a given retry attempt.
    pub fn base_delay(self, attempt: u32) -> Duration {
        let scale = self.factor.powi(attempt.min(i32::MAX as u32) as i32);
        Duration::from_secs_f64(self.base.as_secs_f64() * scale)
    }

    /// Full delay for a given retry attempt, jitter included.
    pub fn delay(self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis().min(u128::from(u64::MAX)) as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(fastrand::u64(0..jitter_ms))
        };
        self.base_delay(attempt) + jitter
    }
}

/// Configuration for the retry executor.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first call.
    pub max_attempts: u32,
    /// The backoff strategy to use between attempts.
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Result<Self, ValidationError> {
        if max_attempts == 0 {
            return Err(ValidationError::ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            backoff,
        })
    }

    /// Calculate the delay for a given retry attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Runs `call` until it succeeds or `max_attempts` is reached.
    ///
    /// Sleeps between a failed attempt and the next one, never after the
    /// final attempt. On exhaustion the most recent error is returned.
    pub async fn run<T, E, F, Fut>(&self, call: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_while(call, |_| true).await
    }

    /// Like [`RetryConfig::run`], but gives up at once on errors for which
    /// `retryable` returns `false`.
    pub async fn run_while<T, E, F, Fut, P>(&self, mut call: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt + 1 >= attempts || !retryable(&error) => return Err(error),
                Err(error) => {
                    let delay = self.delay_for_attempt(attempt);
                    debug!(
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
