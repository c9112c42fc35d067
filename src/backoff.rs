//! Linear backoff between retry attempts.
//!
//! After the failed attempt with zero-based index `n`, the policy waits `base * (n + 1)`:
//! with a one second base that is 1s, 2s, 3s, ... The wait does not look at the failure
//! or the response; it is a fixed function of the attempt count.
//!
//! ```rust
//! use std::time::Duration;
//! use apiguard::Backoff;
//!
//! let backoff = Backoff::linear(Duration::from_millis(100));
//! assert_eq!(backoff.delay_after(0), Duration::from_millis(100));
//! assert_eq!(backoff.delay_after(2), Duration::from_millis(300));
//! ```
//!
//! Overflow saturates at [`MAX_BACKOFF`] (1 day).

use std::time::Duration;

/// Ceiling for computed delays.
pub const MAX_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Base delay used when the caller does not choose one.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);

/// Invalid backoff configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackoffError {
    #[error("max must be greater than zero")]
    MaxMustBePositive,
    #[error("max ({max:?}) must be >= base ({base:?})")]
    MaxLessThanBase { base: Duration, max: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Option<Duration>,
}

impl Backoff {
    /// Wait `base * (attempt + 1)` after each failed attempt.
    pub fn linear(base: Duration) -> Self {
        Self { base, max: None }
    }

    /// Retry back to back.
    pub fn none() -> Self {
        Self::linear(Duration::ZERO)
    }

    /// Cap every delay at `max`.
    pub fn with_max(mut self, max: Duration) -> Result<Self, BackoffError> {
        if max.is_zero() {
            return Err(BackoffError::MaxMustBePositive);
        }
        if max < self.base {
            return Err(BackoffError::MaxLessThanBase { base: self.base, max });
        }
        self.max = Some(max);
        Ok(self)
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    /// Delay before the next attempt, given the zero-based index of the attempt that failed.
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt.saturating_add(1)).unwrap_or(u32::MAX);
        let linear = self.base.checked_mul(factor).unwrap_or(MAX_BACKOFF);
        let capped = self.max.map_or(linear, |max| linear.min(max));
        capped.min(MAX_BACKOFF)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::linear(DEFAULT_BASE_DELAY)
    }
}
