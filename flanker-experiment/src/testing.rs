//! Simulated display and keyboard sharing one virtual clock.
//!
//! Every presented frame advances time by one refresh period. Key presses
//! are scheduled at absolute times, either directly or by hooks that watch
//! the presented frames, and become visible to the poller once the virtual
//! clock has passed them.

use crate::input::{InputPoller, KeyPress, KeyQueue};
use crate::results::{ResultsLog, ResultsSink, RunStatus, SinkError};
use crate::screen::{DisplayError, Screen};
use flanker_core::Key;
use flanker_timing::Timer;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub(crate) const PERIOD_60HZ: u64 = 16_666_667;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Draw {
    Fixation,
    Stimulus(String),
    Reminder,
    Feedback(String),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct PresentedFrame {
    pub at: u64,
    pub draws: Vec<Draw>,
}

impl PresentedFrame {
    pub fn stimulus(&self) -> Option<&str> {
        self.draws.iter().find_map(|d| match d {
            Draw::Stimulus(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn feedback(&self) -> Option<&str> {
        self.draws.iter().find_map(|d| match d {
            Draw::Feedback(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn text(&self) -> Option<&str> {
        self.draws.iter().find_map(|d| match d {
            Draw::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn has(&self, draw: &Draw) -> bool {
        self.draws.contains(draw)
    }

    pub fn is_blank(&self) -> bool {
        self.draws.is_empty()
    }
}

type Hook = Box<dyn FnMut(&PresentedFrame) -> Vec<(u64, Key)> + Send>;

struct SimState {
    now: u64,
    period: u64,
    frames: Vec<PresentedFrame>,
    scheduled: Vec<KeyPress>,
    hooks: Vec<Hook>,
    close_after: Option<usize>,
}

#[derive(Clone)]
pub(crate) struct Sim(Arc<Mutex<SimState>>);

impl Sim {
    pub fn new(fps: u32) -> Self {
        Self::with_period(1_000_000_000 / u64::from(fps))
    }

    pub fn with_period(period: u64) -> Self {
        Self(Arc::new(Mutex::new(SimState {
            now: 0,
            period,
            frames: Vec::new(),
            scheduled: Vec::new(),
            hooks: Vec::new(),
            close_after: None,
        })))
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.0.lock().unwrap()
    }

    pub fn screen(&self) -> SimScreen {
        SimScreen {
            sim: self.clone(),
            pending: Vec::new(),
        }
    }

    pub fn input(&self) -> SimInput {
        SimInput {
            sim: self.clone(),
            queue: KeyQueue::new(),
        }
    }

    pub fn timer(&self) -> SimTimer {
        SimTimer(self.clone())
    }

    pub fn period(&self) -> u64 {
        self.state().period
    }

    pub fn frames(&self) -> Vec<PresentedFrame> {
        self.state().frames.clone()
    }

    pub fn press_at(&self, at: u64, key: Key) {
        self.state().scheduled.push(KeyPress { key, timestamp: at });
    }

    pub fn on_frame<F>(&self, hook: F)
    where
        F: FnMut(&PresentedFrame) -> Vec<(u64, Key)> + Send + 'static,
    {
        self.state().hooks.push(Box::new(hook));
    }

    /// Presses the continue key as soon as an instruction screen is shown.
    pub fn auto_continue(&self) {
        self.on_frame(|frame| match frame.text() {
            Some(_) => vec![(frame.at, Key::CONTINUE)],
            None => Vec::new(),
        });
    }

    /// Answers each stimulus onset with `reply(stimulus)`: a key and its
    /// delay from the onset flip.
    pub fn respond_with<F>(&self, mut reply: F)
    where
        F: FnMut(&str) -> Option<(Key, Duration)> + Send + 'static,
    {
        let mut showing = false;
        self.on_frame(move |frame| {
            let stimulus = frame.stimulus();
            let onset = stimulus.is_some() && !showing;
            showing = stimulus.is_some();
            match stimulus {
                Some(s) if onset => reply(s)
                    .map(|(key, delay)| vec![(frame.at + delay.as_nanos() as u64, key)])
                    .unwrap_or_default(),
                _ => Vec::new(),
            }
        });
    }

    pub fn respond(&self, key: Key, delay: Duration) {
        self.respond_with(move |_| Some((key.clone(), delay)));
    }

    /// Presses the exit key right after the `n`th stimulus onset (1-based).
    pub fn exit_at_onset(&self, n: usize) {
        let mut onsets = 0;
        let mut showing = false;
        self.on_frame(move |frame| {
            let stimulus = frame.stimulus().is_some();
            if stimulus && !showing {
                onsets += 1;
            }
            showing = stimulus;
            if stimulus && onsets == n {
                vec![(frame.at, Key::EXIT)]
            } else {
                Vec::new()
            }
        });
    }

    /// Fails every present after `frames` successful ones.
    pub fn close_after(&self, frames: usize) {
        self.state().close_after = Some(frames);
    }
}

pub(crate) struct SimScreen {
    sim: Sim,
    pending: Vec<Draw>,
}

impl Screen for SimScreen {
    fn draw_fixation(&mut self) {
        self.pending.push(Draw::Fixation);
    }

    fn draw_stimulus(&mut self, text: &str) {
        self.pending.push(Draw::Stimulus(text.to_string()));
    }

    fn draw_reminder(&mut self) {
        self.pending.push(Draw::Reminder);
    }

    fn draw_feedback(&mut self, text: &str) {
        self.pending.push(Draw::Feedback(text.to_string()));
    }

    fn draw_text(&mut self, text: &str) {
        self.pending.push(Draw::Text(text.to_string()));
    }

    fn present_frame(&mut self) -> Result<u64, DisplayError> {
        let mut state = self.sim.state();
        if state.close_after.is_some_and(|n| state.frames.len() >= n) {
            return Err(DisplayError::Closed);
        }
        state.now += state.period;
        let frame = PresentedFrame {
            at: state.now,
            draws: std::mem::take(&mut self.pending),
        };
        let mut hooks = std::mem::take(&mut state.hooks);
        for hook in hooks.iter_mut() {
            for (at, key) in hook(&frame) {
                state.scheduled.push(KeyPress { key, timestamp: at });
            }
        }
        state.hooks = hooks;
        state.frames.push(frame);
        Ok(state.now)
    }

    fn resolution(&self) -> (u32, u32) {
        (1920, 1080)
    }
}

pub(crate) struct SimInput {
    sim: Sim,
    queue: KeyQueue,
}

impl SimInput {
    fn sync(&mut self) {
        let mut state = self.sim.state();
        let now = state.now;
        let mut due: Vec<KeyPress> = Vec::new();
        state.scheduled.retain(|press| {
            if press.timestamp <= now {
                due.push(press.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|press| press.timestamp);
        for press in due {
            self.queue.push(press);
        }
    }
}

impl InputPoller for SimInput {
    fn poll_keys(&mut self, accepted: &[Key]) -> Option<KeyPress> {
        self.sync();
        self.queue.poll_keys(accepted)
    }

    fn check_exit(&mut self, key: &Key) -> bool {
        self.sync();
        self.queue.check_exit(key)
    }

    fn clear_events(&mut self) {
        self.sync();
        self.queue.clear_events();
    }
}

#[derive(Clone)]
pub(crate) struct SimTimer(Sim);

impl Timer for SimTimer {
    fn now(&self) -> u64 {
        self.0.state().now
    }

    fn sleep(&self, d: Duration) {
        self.0.state().now += d.as_nanos() as u64;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Saved {
    pub rows: Vec<Vec<String>>,
    pub status: RunStatus,
}

/// Keeps every persisted snapshot in memory.
#[derive(Clone, Default)]
pub(crate) struct MemorySink {
    saves: Arc<Mutex<Vec<Saved>>>,
}

impl MemorySink {
    pub fn saves(&self) -> Vec<Saved> {
        self.saves.lock().unwrap().clone()
    }

    pub fn last(&self) -> Saved {
        self.saves().pop().expect("nothing persisted")
    }
}

impl ResultsSink for MemorySink {
    fn persist(&mut self, log: &ResultsLog) -> Result<PathBuf, SinkError> {
        self.saves.lock().unwrap().push(Saved {
            rows: log.rows(),
            status: log.meta().status.clone(),
        });
        Ok(PathBuf::from("memory"))
    }
}
