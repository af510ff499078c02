//! # Backoff Timer
//!
//! The cooperative exponential timer behind every long-running loop in
//! the pipeline: health checks, reconnection attempts, loader ticks, and
//! iterator ticks all advance one of these between rounds.

use std::time::Duration;

/// Exponential backoff with a cap.
///
/// `delay()` reads the current interval; `advance()` grows it toward the
/// cap; `reset()` snaps back to the initial interval. Loops that want the
/// cadence to drift (loader ticks after a quiet round) call `advance`
/// without `reset`; loops that want to fire quickly again after an error
/// call `reset`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    multiplier: f64,
    cap: Duration,
    current: Duration,
}

impl Backoff {
    /// Create a backoff starting at `initial`, growing by `multiplier`
    /// per step, never exceeding `cap`.
    pub fn new(initial: Duration, multiplier: f64, cap: Duration) -> Self {
        Self {
            initial,
            multiplier,
            cap,
            current: initial,
        }
    }

    /// The current interval.
    pub fn delay(&self) -> Duration {
        self.current
    }

    /// Grow the interval one step and return the new value.
    pub fn advance(&mut self) -> Duration {
        self.current = self.current.mul_f64(self.multiplier).min(self.cap);
        self.current
    }

    /// Snap back to the initial interval.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    /// True once the interval has reached the cap.
    pub fn at_cap(&self) -> bool {
        self.current >= self.cap
    }
}
