use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Window length and per-window capacity of the fixed-window limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub window: Duration,
    pub capacity: u32,
}

// Deadline used when `now + window` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

impl RatePolicy {
    /// Capacity is at least one; a window that admits nothing is not a rate limit.
    #[must_use]
    pub const fn new(window: Duration, capacity: u32) -> Self {
        Self { window, capacity: if capacity == 0 { 1 } else { capacity } }
    }

    /// End of a window opened at `now`, saturating instead of overflowing.
    #[must_use]
    pub fn window_end(self, now: Instant) -> Instant {
        now.checked_add(self.window).or_else(|| now.checked_add(FAR_FUTURE)).unwrap_or(now)
    }
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), 5)
    }
}

/// Decision for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// `retry_after` is the time left in the current window, when the backend knows it.
    Throttled { retry_after: Option<Duration> },
}

impl Admission {
    #[must_use]
    pub const fn is_admitted(self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Per-identifier counter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRecord {
    pub count: u32,
    pub window_reset_at: Instant,
}

impl RateRecord {
    #[must_use]
    pub fn fresh(now: Instant, policy: RatePolicy) -> Self {
        Self { count: 1, window_reset_at: policy.window_end(now) }
    }

    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.window_reset_at
    }

    /// Applies one request to this record.
    ///
    /// An expired record restarts at 1 rather than incrementing. A full window rejects
    /// without incrementing.
    pub fn register(&mut self, now: Instant, policy: RatePolicy) -> Admission {
        if self.is_expired(now) {
            *self = Self::fresh(now, policy);
            return Admission::Admitted;
        }

        if self.count < policy.capacity {
            self.count += 1;
            Admission::Admitted
        } else {
            Admission::Throttled { retry_after: Some(self.window_reset_at.saturating_duration_since(now)) }
        }
    }
}

/// Backing store for admission counters.
///
/// Implementations must make `hit` a single atomic check-and-increment per key: two concurrent
/// hits competing for the last slot must never both be admitted.
#[async_trait]
pub trait RateStore: Send + Sync + std::fmt::Debug {
    /// Registers one request for `key` and returns the admission decision.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend cannot be reached.
    async fn hit(&self, key: &str, now: Instant, policy: RatePolicy) -> Result<Admission, StoreError>;

    /// Drops records whose window has elapsed and returns how many were removed.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend cannot be reached.
    async fn sweep(&self, now: Instant) -> Result<usize, StoreError>;

    /// Checks that the backend is reachable.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend cannot be reached.
    async fn ping(&self) -> Result<(), StoreError>;
}
