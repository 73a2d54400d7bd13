use crate::classify::ResponseMapping;
use crate::config::{ConfigError, ExperimentConfig};
use crate::error::{AbortReason, SessionError};
use crate::frames::Frames;
use crate::input::InputPoller;
use crate::messages::{MessageTemplate, Messages};
use crate::results::{ResultsGuard, ResultsLog, ResultsSink, RunStatus};
use crate::screen::Screen;
use crate::selector::StimulusSelector;
use crate::trial::{TrialKind, TrialRunner, TrialSettings};
use flanker_core::{ParticipantId, SessionPhase};
use flanker_timing::Timer;
use rand::Rng;
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Aborted(AbortReason),
}

#[derive(Debug)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub trials_recorded: usize,
    /// Set when the run completed; aborted runs are saved by the guard.
    pub results_path: Option<PathBuf>,
}

/// Sequences one participant's session: calibration, instructions,
/// training, experiment blocks, saving and the closing screen.
pub struct SessionManager<S, I, T: Timer, R: Rng> {
    frames: Frames<S, I, T>,
    selector: StimulusSelector<R>,
    settings: TrialSettings,
    mapping: ResponseMapping,
    config: ExperimentConfig,
    messages: Messages,
    participant: ParticipantId,
    phase: SessionPhase,
}

impl<S: Screen, I: InputPoller, T: Timer, R: Rng> SessionManager<S, I, T, R> {
    pub fn new(
        config: ExperimentConfig,
        messages: Messages,
        participant: ParticipantId,
        frames: Frames<S, I, T>,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mapping = ResponseMapping::from_keys(&config.reaction_keys)?;
        let selector = StimulusSelector::new(config.stimuli.clone(), rng)?;
        Ok(Self {
            frames,
            selector,
            settings: TrialSettings::from(&config),
            mapping,
            config,
            messages,
            participant,
            phase: SessionPhase::default(),
        })
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn frames_mut(&mut self) -> &mut Frames<S, I, T> {
        &mut self.frames
    }

    /// Runs the whole session, saving through `sink`.
    ///
    /// An exit-key press is an outcome, not an error. Whatever ends the run,
    /// the records gathered so far are saved before this returns.
    pub fn run<K: ResultsSink>(&mut self, sink: K) -> Result<SessionReport, SessionError> {
        let log = ResultsLog::new(
            self.participant.clone(),
            self.config.feedback_labels.clone(),
            self.config.frame_rate,
        );
        let mut guard = ResultsGuard::new(log, sink);
        info!(
            participant = %self.participant,
            trials = self.config.total_trials(),
            "session started"
        );

        match self.run_phases(&mut guard) {
            Ok(()) => {
                guard.set_status(RunStatus::Completed);
                let trials_recorded = guard.log().len();
                let path = guard.finish()?;
                self.enter(SessionPhase::Debrief);
                let end = self.messages.end.render(None);
                match self.frames.show_info(&end) {
                    // data is already saved, leaving the end screen early is fine
                    Ok(()) | Err(SessionError::Aborted(_)) => {}
                    Err(err) => return Err(err),
                }
                info!(trials_recorded, "session completed");
                Ok(SessionReport {
                    outcome: SessionOutcome::Completed,
                    trials_recorded,
                    results_path: Some(path),
                })
            }
            Err(SessionError::Aborted(reason)) => {
                error!(%reason, phase = ?self.phase, "session aborted");
                guard.set_status(RunStatus::Aborted(reason.to_string()));
                let trials_recorded = guard.log().len();
                drop(guard);
                Ok(SessionReport {
                    outcome: SessionOutcome::Aborted(reason),
                    trials_recorded,
                    results_path: None,
                })
            }
            Err(err) => {
                error!(%err, phase = ?self.phase, "session failed");
                guard.set_status(RunStatus::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    fn run_phases<K: ResultsSink>(
        &mut self,
        guard: &mut ResultsGuard<K>,
    ) -> Result<(), SessionError> {
        self.enter(SessionPhase::Calibration);
        self.check_frame_rate(guard)?;

        self.enter(SessionPhase::Welcome);
        self.show(|m| &m.hello, None)?;

        self.enter(SessionPhase::Training);
        self.show(|m| &m.before_training, None)?;
        self.show(|m| &m.reminder, None)?;
        for _ in 0..self.config.training_trials {
            self.run_trial(TrialKind::Training, guard)?;
        }

        self.enter(SessionPhase::Experiment);
        self.show(|m| &m.before_experiment, None)?;
        self.show(|m| &m.reminder, None)?;
        let blocks = self.config.blocks;
        for block in 0..blocks {
            info!(block, "block started");
            for _ in 0..self.config.trials_per_block {
                self.run_trial(TrialKind::Experiment { block }, guard)?;
                self.frames
                    .hold(self.settings.break_frames, |screen| screen.draw_reminder())?;
            }
            if block + 1 < blocks {
                let progress = format!("{}/{}\n", block + 1, blocks);
                self.show(|m| &m.block_break, Some(&progress))?;
            }
        }
        Ok(())
    }

    fn check_frame_rate<K: ResultsSink>(
        &mut self,
        guard: &mut ResultsGuard<K>,
    ) -> Result<(), SessionError> {
        let stats = self.frames.calibrate(self.config.calibration_frames)?;
        let detected = stats.rounded_fps();
        let resolution = self.frames.screen().resolution();
        info!(
            detected,
            jitter_ms = stats.jitter_ns / 1e6,
            samples = stats.samples,
            "FRAME RATE: {detected}"
        );
        info!("SCREEN RES: {}x{}", resolution.0, resolution.1);

        let meta = guard.log_mut().meta_mut();
        meta.detected_frame_rate = Some(detected);
        meta.frame_jitter_ms = Some(stats.jitter_ns / 1e6);
        meta.resolution = Some(resolution);

        if detected != self.config.frame_rate {
            return Err(SessionError::FrameRateMismatch {
                detected,
                expected: self.config.frame_rate,
            });
        }
        Ok(())
    }

    fn run_trial<K: ResultsSink>(
        &mut self,
        kind: TrialKind,
        guard: &mut ResultsGuard<K>,
    ) -> Result<(), SessionError> {
        let outcome = TrialRunner::new(
            &mut self.frames,
            &mut self.selector,
            &self.settings,
            &self.mapping,
            &self.config.feedback_labels,
        )
        .run(kind)?;
        let record = guard.record(outcome);
        debug!(
            trial_no = record.trial_no,
            block = record.kind.block_no(),
            stimulus = %record.stimulus,
            key = %record.response.key_pressed(),
            rt = record.response.reaction_time_secs(),
            verdict = ?record.kind.verdict(),
            "trial recorded"
        );
        Ok(())
    }

    fn show<F>(&mut self, pick: F, insert: Option<&str>) -> Result<(), SessionError>
    where
        F: FnOnce(&Messages) -> &MessageTemplate,
    {
        let text = pick(&self.messages).render(insert);
        self.frames.show_info(&text)
    }

    fn enter(&mut self, phase: SessionPhase) {
        info!(from = ?self.phase, to = ?phase, "phase change");
        self.phase = phase;
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
