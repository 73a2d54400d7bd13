use crate::messages::MessageError;
use crate::results::SinkError;
use crate::screen::DisplayError;
use flanker_core::Key;
use thiserror::Error;

/// Why a session was cancelled by the person running it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortReason {
    #[error("Experiment finished by user! {0} pressed.")]
    ExitKey(Key),
    #[error("Experiment finished by user on info screen! {0} pressed.")]
    ExitKeyOnInfoScreen(Key),
}

/// Everything that ends a session early.
///
/// `Aborted` is the cooperative cancellation path and is turned into
/// [`crate::SessionOutcome::Aborted`] at the top of the session; the other
/// variants are real failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Aborted(AbortReason),
    #[error("Wrong no of frames detected: {detected}. Experiment terminated (expected {expected}).")]
    FrameRateMismatch { detected: u32, expected: u32 },
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl SessionError {
    #[cfg(test)]
    pub(crate) fn is_abort(&self) -> bool {
        matches!(self, SessionError::Aborted(_))
    }
}
