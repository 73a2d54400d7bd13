use crate::timer::Timer;
use std::time::Duration;
use tracing::trace;

/// Holds presentation to the frame period when the surface does not block
/// on vertical sync by itself.
#[derive(Debug, Clone)]
pub struct FramePacer {
    period: Duration,
    slack: Duration,
}

impl FramePacer {
    pub fn new(refresh_hz: u32) -> Self {
        let period = Duration::from_nanos(1_000_000_000 / u64::from(refresh_hz.max(1)));
        Self {
            period,
            slack: Duration::from_micros(500),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// How long to wait after a flip at `last_flip` given the time `now`.
    ///
    /// Zero once the period has (nearly) elapsed, so a surface that already
    /// waited for vsync is never delayed by another frame.
    pub fn remaining(&self, last_flip: u64, now: u64) -> Duration {
        let since = Duration::from_nanos(now.saturating_sub(last_flip));
        let remaining = self.period.saturating_sub(since);
        if remaining <= self.slack {
            Duration::ZERO
        } else {
            remaining
        }
    }

    /// Sleeps out the rest of the frame that started at `last_flip`.
    pub fn pace<T: Timer>(&self, timer: &T, last_flip: u64) {
        let remaining = self.remaining(last_flip, timer.now());
        if !remaining.is_zero() {
            trace!(remaining_us = remaining.as_micros() as u64, "pacing frame");
            timer.sleep(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_follows_refresh_rate() {
        assert_eq!(FramePacer::new(100).period(), Duration::from_millis(10));
    }

    #[test]
    fn early_returns_are_padded_to_the_period() {
        let pacer = FramePacer::new(100);
        assert_eq!(pacer.remaining(0, 4_000_000), Duration::from_millis(6));
    }

    #[test]
    fn blocked_surfaces_are_not_delayed() {
        let pacer = FramePacer::new(100);
        assert_eq!(pacer.remaining(0, 9_800_000), Duration::ZERO);
        assert_eq!(pacer.remaining(0, 25_000_000), Duration::ZERO);
    }
}
