//! Generic retry with configurable back-off.
//!
//! Every call site that retries (Graph GETs, media downloads, the file
//! activation poll, and the inference call) goes through [`retry`] with its
//! own [`RetryPolicy`] and retriable-error predicate instead of hand-rolling
//! a loop.

use std::future::Future;
use std::time::Duration;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry. Used for status polling.
    Constant(Duration),
    /// `base × 2^(retry - 1)`, capped at `max`. With `jitter` the delay is
    /// scaled by a random factor in `[0.75, 1.25)`.
    Exponential {
        base: Duration,
        max: Duration,
        jitter: bool,
    },
}

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Constant(Duration::ZERO),
        }
    }

    /// Constant-interval policy, e.g. "poll every 2 s, up to 20 times".
    #[must_use]
    pub fn constant(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Constant(interval),
        }
    }

    /// Exponential policy without jitter, capped at 60 s per delay.
    #[must_use]
    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential {
                base,
                max: Duration::from_secs(60),
                jitter: false,
            },
        }
    }

    #[must_use]
    pub fn with_jitter(mut self) -> Self {
        if let Backoff::Exponential { jitter, .. } = &mut self.backoff {
            *jitter = true;
        }
        self
    }

    /// Delay to sleep before retry number `retry` (1-based).
    ///
    /// | retry | exponential (base 2 s) |
    /// |-------|------------------------|
    /// | 1     | 2 s                    |
    /// | 2     | 4 s                    |
    /// | 3     | 8 s                    |
    /// | 4     | 16 s                   |
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Constant(d) => d,
            Backoff::Exponential { base, max, jitter } => {
                let factor = 1u32 << retry.saturating_sub(1).min(20);
                let capped = base.saturating_mul(factor).min(max);
                if jitter {
                    capped.mul_f64(rand::random::<f64>() * 0.5 + 0.75)
                } else {
                    capped
                }
            }
        }
    }
}

/// Runs `operation` until it succeeds, fails with an error that
/// `is_retriable` rejects, or `policy.max_attempts` is exhausted. The last
/// error is returned in the failure cases.
///
/// # Errors
///
/// Returns the operation's own error unchanged.
pub async fn retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    is_retriable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts || !is_retriable(&err) {
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient error, retrying after back-off"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}
