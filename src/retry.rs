// SPDX-License-Identifier: MIT
//! Attempt-bounded retry loop used by the bootstrap sequencer.
//!
//! The sequencer retries engine installs with a fixed delay between
//! attempts; the delay strategy lives in [`RetryPolicy`] so it can be
//! swapped (or made exponential) without touching the loop. Errors the
//! caller knows to be permanent can short-circuit the loop through the
//! predicate taken by [`retry_with_policy_if`].

use std::time::Duration;
use tracing::{debug, warn};

/// Delay strategy applied between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed,
    /// Delay multiplied after each attempt, capped at `max_delay`.
    Exponential { multiplier: f64, max_delay: Duration },
}

/// Attempt budget and delay strategy for [`retry_with_policy`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first try).
    ///
    /// Default: 3
    pub max_attempts: u32,
    /// Delay before the second attempt.
    ///
    /// Default: 1000 ms
    pub delay: Duration,
    /// Strategy used to derive each subsequent delay.
    ///
    /// Default: [`Backoff::Fixed`]
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    /// Create a policy suitable for quick unit tests (no real waiting).
    pub fn instant() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1),
            backoff: Backoff::Fixed,
        }
    }

    /// Create a policy with a single attempt (no retries).
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
            backoff: Backoff::Fixed,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential {
                multiplier,
                max_delay,
            } => {
                let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
                let ms = (self.delay.as_millis() as f64 * factor) as u128;
                Duration::from_millis(ms.min(max_delay.as_millis()) as u64)
            }
        }
    }
}

/// Retry an async operation, treating every error as transient.
///
/// Equivalent to [`retry_with_policy_if`] with an always-true predicate.
pub async fn retry_with_policy<F, Fut, T, E>(policy: &RetryPolicy, f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    retry_with_policy_if(policy, f, |_| true).await
}

/// Retry an async operation, consulting `is_retryable` on each failure.
///
/// Calls `f()` up to `policy.max_attempts` times. A failure deemed
/// non-retryable is returned immediately without burning further attempts
/// or sleeping; otherwise the loop waits `policy.delay_for(n)` and tries
/// again. Each transient failure is logged at `warn`; only the final error
/// reaches the caller.
///
/// # Panics
/// Panics if `policy.max_attempts` is 0 (would never attempt the operation).
pub async fn retry_with_policy_if<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut f: F,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    assert!(
        policy.max_attempts > 0,
        "RetryPolicy.max_attempts must be at least 1"
    );

    for attempt in 1..=policy.max_attempts {
        let err = match f().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "retry succeeded");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !is_retryable(&err) {
            debug!(attempt, err = ?err, "non-retryable error — giving up");
            return Err(err);
        }
        if attempt == policy.max_attempts {
            warn!(
                attempt,
                max = policy.max_attempts,
                err = ?err,
                "all retry attempts exhausted"
            );
            return Err(err);
        }

        let delay = policy.delay_for(attempt);
        warn!(
            attempt,
            max = policy.max_attempts,
            delay_ms = delay.as_millis(),
            err = ?err,
            "attempt failed — retrying"
        );
        tokio::time::sleep(delay).await;
    }

    unreachable!("retry loop returns on success, exhaustion, or non-retryable error")
}
