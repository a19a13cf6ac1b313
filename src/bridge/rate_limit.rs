//! Minimum-interval limiter on a monotonic clock

use std::time::{Duration, Instant};

/// Allows at most one event per `interval`, measured on `Instant`, so the
/// cadence is independent of frame rate.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether an event may fire at `now`, without consuming the slot
    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Take the slot if it is free
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self.is_ready(now) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }
}
