use std::time::Duration;

/// Accumulates frame time and fires once per interval.
///
/// Fires when the accumulated time reaches the interval and then starts
/// again from zero; the overshoot is dropped.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval: Duration,
    elapsed: Duration,
}

impl IntervalTimer {
    #[inline]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
        }
    }

    #[inline]
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Advance by `dt`; returns `true` when the interval elapsed.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed >= self.interval {
            self.elapsed = Duration::ZERO;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
