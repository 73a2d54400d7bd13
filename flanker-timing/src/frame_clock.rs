use crate::calibration::{CalibrationStats, FrameTimes};
use crate::timer::Timer;
use std::time::Duration;

/// Frame-locked reaction-time clock.
///
/// The display reports every completed flip through [`FrameClock::flip_completed`].
/// [`FrameClock::reset_on_next_flip`] arms the clock so that the origin lands on
/// the next flip instead of on the call, which is when a stimulus actually
/// becomes visible.
#[derive(Debug, Clone)]
pub struct FrameClock<T: Timer> {
    timer: T,
    origin: Option<u64>,
    armed: bool,
    last_flip: Option<u64>,
    frame_count: u64,
    frame_times: FrameTimes,
}

impl<T: Timer> FrameClock<T> {
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            origin: None,
            armed: false,
            last_flip: None,
            frame_count: 0,
            frame_times: FrameTimes::default(),
        }
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Records a flip that completed at `ts`.
    pub fn flip_completed(&mut self, ts: u64) {
        if let Some(prev) = self.last_flip {
            self.frame_times
                .record(Duration::from_nanos(ts.saturating_sub(prev)));
        }
        if self.armed {
            self.armed = false;
            self.origin = Some(ts);
        }
        self.last_flip = Some(ts);
        self.frame_count += 1;
    }

    pub fn reset_on_next_flip(&mut self) {
        self.armed = true;
    }

    #[cfg(test)]
    fn is_armed(&self) -> bool {
        self.armed
    }

    /// Time since the last reset. Zero while no reset has landed yet.
    pub fn elapsed(&self) -> Duration {
        match self.origin {
            Some(origin) if !self.armed => self.timer.elapsed(origin),
            _ => Duration::ZERO,
        }
    }

    /// Converts an event timestamp into time since the last reset.
    ///
    /// `None` while the reset is still pending. Events stamped before the
    /// origin flip count as zero.
    pub fn since_reset(&self, ts: u64) -> Option<Duration> {
        if self.armed {
            return None;
        }
        self.origin
            .map(|origin| Duration::from_nanos(ts.saturating_sub(origin)))
    }

    pub fn last_flip(&self) -> Option<u64> {
        self.last_flip
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn calibration_stats(&self) -> CalibrationStats {
        self.frame_times.stats()
    }

    /// Forgets recorded intervals, e.g. before a calibration run.
    pub fn clear_frame_times(&mut self) {
        self.frame_times.clear();
        self.last_flip = None;
    }
}
