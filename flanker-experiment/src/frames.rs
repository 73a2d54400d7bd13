use crate::error::{AbortReason, SessionError};
use crate::input::InputPoller;
use crate::screen::Screen;
use flanker_core::Key;
use flanker_timing::{CalibrationStats, FrameClock, Timer};

/// The screen, the keyboard and the frame clock, driven together.
///
/// Every loop in a session advances one flip per iteration and checks the
/// exit key after each flip, so a press during the last frame of a loop is
/// still seen.
pub struct Frames<S, I, T: Timer> {
    screen: S,
    input: I,
    clock: FrameClock<T>,
    exit_key: Key,
}

impl<S: Screen, I: InputPoller, T: Timer> Frames<S, I, T> {
    pub fn new(screen: S, input: I, timer: T) -> Self {
        Self {
            screen,
            input,
            clock: FrameClock::new(timer),
            exit_key: Key::EXIT,
        }
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn clock(&self) -> &FrameClock<T> {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock<T> {
        &mut self.clock
    }

    /// Presents the composed frame and waits for it to reach the screen.
    pub fn flip(&mut self) -> Result<u64, SessionError> {
        let ts = self.screen.present_frame()?;
        self.clock.flip_completed(ts);
        Ok(ts)
    }

    pub fn check_exit(&mut self) -> Result<(), SessionError> {
        if self.input.check_exit(&self.exit_key) {
            return Err(SessionError::Aborted(AbortReason::ExitKey(
                self.exit_key.clone(),
            )));
        }
        Ok(())
    }

    /// Drops queued input before a new screen. A pending exit key is not
    /// dropped: it aborts here.
    pub fn discard_input(&mut self) -> Result<(), SessionError> {
        self.check_exit()?;
        self.input.clear_events();
        Ok(())
    }

    /// Shows `draw`'s output for `frames` flips.
    pub fn hold<F>(&mut self, frames: u32, mut draw: F) -> Result<(), SessionError>
    where
        F: FnMut(&mut S),
    {
        self.check_exit()?;
        for _ in 0..frames {
            draw(&mut self.screen);
            self.flip()?;
            self.check_exit()?;
        }
        Ok(())
    }

    /// Instruction screen: stays up until the continue key is pressed.
    /// Leaves one blank frame behind.
    pub fn show_info(&mut self, text: &str) -> Result<(), SessionError> {
        self.discard_input()?;
        loop {
            if self.input.check_exit(&self.exit_key) {
                return Err(SessionError::Aborted(AbortReason::ExitKeyOnInfoScreen(
                    self.exit_key.clone(),
                )));
            }
            self.screen.draw_text(text);
            self.flip()?;
            if self.input.poll_keys(&[Key::CONTINUE]).is_some() {
                break;
            }
        }
        self.flip()?;
        Ok(())
    }

    /// Presents blank frames and measures the refresh rate from their flips.
    pub fn calibrate(&mut self, frames: u32) -> Result<CalibrationStats, SessionError> {
        self.clock.clear_frame_times();
        self.hold(frames.max(2), |_| {})?;
        Ok(self.clock.calibration_stats())
    }
}

#[cfg(test)]
#[path = "tests/frames_tests.rs"]
mod tests;
