//! Bounded retry with a fixed delay between attempts.
//!
//! DESIGN
//! ======
//! The policy knows nothing about the call it wraps: the caller supplies a
//! classifier that marks each error `Retry` or `Stop`. Only `Retry` errors
//! consume another attempt; a `Stop` error returns immediately.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::BootRetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Stop,
}

/// Final failure of a retried call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryError<E> {
    /// Error from the last attempt.
    pub error: E,
    /// Attempts made, including the first.
    pub attempts: u32,
    /// `true` when the last error was retryable but attempts ran out.
    pub exhausted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; values below 1 are treated as 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }

    /// Single attempt, no retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` until it succeeds, `classify` says stop, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns the last error together with the attempt count.
    pub async fn run<T, E, F, Fut, C>(&self, mut op: F, classify: C) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> RetryDecision,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            let error = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if classify(&error) == RetryDecision::Stop {
                return Err(RetryError { error, attempts: attempt, exhausted: false });
            }
            if attempt >= self.max_attempts {
                return Err(RetryError { error, attempts: attempt, exhausted: true });
            }

            warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "retryable failure; retrying"
            );
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            attempt += 1;
        }
    }
}

impl From<BootRetry> for RetryPolicy {
    fn from(cfg: BootRetry) -> Self {
        Self::new(cfg.attempts, cfg.delay())
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
