use crate::classify::ResponseMapping;
use crate::config::ExperimentConfig;
use crate::error::SessionError;
use crate::frames::Frames;
use crate::input::{InputPoller, KeyPress};
use crate::screen::Screen;
use crate::selector::StimulusSelector;
use flanker_core::{FeedbackLabels, Key, RecordKind, Response, TrialOutcome, Verdict};
use flanker_timing::Timer;
use rand::Rng;
use std::time::Duration;
use tracing::trace;

/// Frame counts for the phases of one trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSettings {
    pub fixation_frames: u32,
    pub stimulus_frames: u32,
    pub feedback_frames: u32,
    pub break_frames: u32,
}

impl From<&ExperimentConfig> for TrialSettings {
    fn from(config: &ExperimentConfig) -> Self {
        Self {
            fixation_frames: config.fixation_frames,
            stimulus_frames: config.stimulus_frames,
            feedback_frames: config.feedback_frames(),
            break_frames: config.break_frames,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialKind {
    Training,
    Experiment { block: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrialState {
    Fixation,
    StimulusWait {
        stimulus: String,
    },
    Responded {
        stimulus: String,
        key: Key,
        reaction_time: Duration,
    },
    TimedOut {
        stimulus: String,
    },
    Feedback {
        stimulus: String,
        response: Response,
        verdict: Verdict,
    },
    Done(TrialOutcome),
}

/// Runs single trials against a borrowed frame driver.
///
/// Fixation, then the stimulus until the first accepted key or the end of
/// the window. A window that runs out ends with one offset frame showing the
/// reminder only. Training trials add feedback and the inter-trial blank;
/// experiment trials return right after the window closes.
pub struct TrialRunner<'a, S, I, T: Timer, R: Rng> {
    frames: &'a mut Frames<S, I, T>,
    selector: &'a mut StimulusSelector<R>,
    settings: &'a TrialSettings,
    mapping: &'a ResponseMapping,
    labels: &'a FeedbackLabels,
}

impl<'a, S: Screen, I: InputPoller, T: Timer, R: Rng> TrialRunner<'a, S, I, T, R> {
    pub fn new(
        frames: &'a mut Frames<S, I, T>,
        selector: &'a mut StimulusSelector<R>,
        settings: &'a TrialSettings,
        mapping: &'a ResponseMapping,
        labels: &'a FeedbackLabels,
    ) -> Self {
        Self {
            frames,
            selector,
            settings,
            mapping,
            labels,
        }
    }

    pub fn run(&mut self, kind: TrialKind) -> Result<TrialOutcome, SessionError> {
        let mut state = TrialState::Fixation;
        loop {
            trace!(?state, "trial step");
            state = match state {
                TrialState::Fixation => {
                    self.fixation()?;
                    TrialState::StimulusWait {
                        stimulus: self.selector.select().to_string(),
                    }
                }
                TrialState::StimulusWait { stimulus } => self.await_response(stimulus)?,
                TrialState::Responded {
                    stimulus,
                    key,
                    reaction_time,
                } => self.settle(
                    kind,
                    stimulus,
                    Response::Pressed { key, reaction_time },
                ),
                TrialState::TimedOut { stimulus } => self.settle(kind, stimulus, Response::Timeout),
                TrialState::Feedback {
                    stimulus,
                    response,
                    verdict,
                } => {
                    self.feedback(verdict)?;
                    TrialState::Done(TrialOutcome {
                        stimulus,
                        response,
                        kind: RecordKind::Training { verdict },
                    })
                }
                TrialState::Done(outcome) => return Ok(outcome),
            };
        }
    }

    fn fixation(&mut self) -> Result<(), SessionError> {
        self.frames.hold(self.settings.fixation_frames, |screen| {
            screen.draw_fixation();
            screen.draw_reminder();
        })
    }

    fn await_response(&mut self, stimulus: String) -> Result<TrialState, SessionError> {
        let accepted = self.mapping.keys();
        // presses made during fixation must not answer this stimulus
        self.frames.discard_input()?;
        self.frames.clock_mut().reset_on_next_flip();

        for _ in 0..self.settings.stimulus_frames {
            let screen = self.frames.screen_mut();
            screen.draw_stimulus(&stimulus);
            screen.draw_reminder();
            self.frames.flip()?;
            self.frames.check_exit()?;

            if let Some(press) = self.frames.input_mut().poll_keys(&accepted) {
                return Ok(self.responded(stimulus, press));
            }
        }

        // The last stimulus frame stays up until the next flip; presses made
        // while it was visible still answer it.
        self.frames.screen_mut().draw_reminder();
        let offset = self.frames.flip()?;
        self.frames.check_exit()?;
        match self.frames.input_mut().poll_keys(&accepted) {
            Some(press) if press.timestamp < offset => Ok(self.responded(stimulus, press)),
            _ => Ok(TrialState::TimedOut { stimulus }),
        }
    }

    fn responded(&self, stimulus: String, press: KeyPress) -> TrialState {
        let reaction_time = self
            .frames
            .clock()
            .since_reset(press.timestamp)
            .unwrap_or_default();
        TrialState::Responded {
            stimulus,
            key: press.key,
            reaction_time,
        }
    }

    fn settle(&self, kind: TrialKind, stimulus: String, response: Response) -> TrialState {
        match kind {
            TrialKind::Training => {
                let verdict = self.mapping.classify(&response.key_pressed(), &stimulus);
                TrialState::Feedback {
                    stimulus,
                    response,
                    verdict,
                }
            }
            TrialKind::Experiment { block } => TrialState::Done(TrialOutcome {
                stimulus,
                response,
                kind: RecordKind::Experiment { block },
            }),
        }
    }

    fn feedback(&mut self, verdict: Verdict) -> Result<(), SessionError> {
        let labels = self.labels;
        let label = labels.label(verdict);
        self.frames.hold(self.settings.feedback_frames, |screen| {
            screen.draw_feedback(label);
            screen.draw_reminder();
        })?;
        self.frames
            .hold(self.settings.break_frames, |screen| screen.draw_reminder())
    }
}

#[cfg(test)]
#[path = "tests/trial_tests.rs"]
mod tests;
