use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display surface was closed")]
    Closed,
    #[error("failed to present frame: {0}")]
    Present(String),
}

/// Drawing surface the trial loop renders onto.
///
/// `draw_*` calls compose the next frame; [`Screen::present_frame`] is the
/// flip. It blocks until the frame is on screen (the next vertical sync) and
/// returns the flip time in nanoseconds on the session's shared
/// [`flanker_timing::Timer`] epoch. The back buffer starts empty after each
/// flip, so a frame that draws nothing shows the background only.
pub trait Screen {
    fn draw_fixation(&mut self);
    fn draw_stimulus(&mut self, text: &str);
    fn draw_reminder(&mut self);
    fn draw_feedback(&mut self, text: &str);
    /// Full-screen instruction text.
    fn draw_text(&mut self, text: &str);
    fn present_frame(&mut self) -> Result<u64, DisplayError>;
    fn resolution(&self) -> (u32, u32);
}
