//! Exponential reconnect backoff.
//!
//! The delay starts at `base`, doubles after every failed connection attempt,
//! never exceeds `max`, and drops back to `base` as soon as a connection
//! succeeds.  No jitter is applied.

use std::time::Duration;

/// Factor applied to the delay after each failure.
pub const BACKOFF_FACTOR: u32 = 2;

/// Bounds of the reconnect delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
}

impl BackoffPolicy {
    /// Creates a policy.  A `max` smaller than `base` is raised to `base`.
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
        }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(15))
    }
}

/// Running backoff state owned by one reconnect loop.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            current: policy.base,
        }
    }

    /// The delay the next failure will wait.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Returns the delay to sleep after a failed attempt and advances the
    /// state to `min(delay * 2, max)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use transcribe_core::{Backoff, BackoffPolicy};
    ///
    /// let mut backoff = Backoff::new(BackoffPolicy::default());
    /// assert_eq!(backoff.next_delay(), Duration::from_millis(500));
    /// assert_eq!(backoff.next_delay(), Duration::from_millis(1000));
    /// ```
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self
            .current
            .saturating_mul(BACKOFF_FACTOR)
            .min(self.policy.max);
        delay
    }

    /// Returns to the base delay after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.policy.base;
    }
}
