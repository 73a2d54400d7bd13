use super::*;
use crate::error::AbortReason;
use crate::testing::{Draw, Sim, SimInput, SimScreen, SimTimer};
use rand::SeedableRng;
use rand::rngs::StdRng;

const FIXATION: u32 = 3;
const WINDOW: u32 = 6;
const FEEDBACK: u32 = 2;
const BREAK: u32 = 2;

struct Rig {
    sim: Sim,
    frames: Frames<SimScreen, SimInput, SimTimer>,
    selector: StimulusSelector<StdRng>,
    settings: TrialSettings,
    mapping: ResponseMapping,
    labels: FeedbackLabels,
}

impl Rig {
    fn new(stimuli: &[&str]) -> Self {
        let sim = Sim::new(60);
        Self {
            frames: Frames::new(sim.screen(), sim.input(), sim.timer()),
            sim,
            selector: StimulusSelector::new(
                stimuli.iter().map(|s| s.to_string()).collect(),
                StdRng::seed_from_u64(3),
            )
            .unwrap(),
            settings: TrialSettings {
                fixation_frames: FIXATION,
                stimulus_frames: WINDOW,
                feedback_frames: FEEDBACK,
                break_frames: BREAK,
            },
            mapping: ResponseMapping::new(Key::Char('a'), Key::Char('l')),
            labels: FeedbackLabels::default(),
        }
    }

    fn run(&mut self, kind: TrialKind) -> Result<TrialOutcome, SessionError> {
        TrialRunner::new(
            &mut self.frames,
            &mut self.selector,
            &self.settings,
            &self.mapping,
            &self.labels,
        )
        .run(kind)
    }

    fn window(&self) -> Duration {
        Duration::from_nanos(self.sim.period() * u64::from(WINDOW))
    }
}

#[test]
fn experiment_timeout_runs_full_window() {
    let mut rig = Rig::new(&["B B X B B"]);
    let outcome = rig.run(TrialKind::Experiment { block: 1 }).unwrap();

    assert_eq!(outcome.stimulus, "B B X B B");
    assert_eq!(outcome.response, Response::Timeout);
    assert_eq!(outcome.kind, RecordKind::Experiment { block: 1 });

    let presented = rig.sim.frames();
    assert_eq!(presented.len(), (FIXATION + WINDOW + 1) as usize);
    let (fixation, rest) = presented.split_at(FIXATION as usize);
    let (window, offset) = rest.split_at(WINDOW as usize);
    for frame in fixation {
        assert_eq!(frame.draws, vec![Draw::Fixation, Draw::Reminder]);
    }
    for frame in window {
        assert_eq!(frame.stimulus(), Some("B B X B B"));
        assert!(frame.has(&Draw::Reminder));
    }
    assert_eq!(offset[0].draws, vec![Draw::Reminder]);
}

#[test]
fn first_accepted_key_ends_the_window_with_exact_rt() {
    let mut rig = Rig::new(&["X"]);
    rig.sim.respond(Key::Char('l'), Duration::from_millis(40));

    let outcome = rig.run(TrialKind::Experiment { block: 0 }).unwrap();
    assert_eq!(
        outcome.response,
        Response::Pressed {
            key: Key::Char('l'),
            reaction_time: Duration::from_millis(40),
        }
    );
    // onset at 0 ms, then flips at 16.7, 33.3 and 50 ms; the last one sees it
    assert_eq!(rig.sim.frames().len(), FIXATION as usize + 4);
}

#[test]
fn fixation_presses_do_not_count() {
    let mut rig = Rig::new(&["X"]);
    let period = rig.sim.period();
    rig.sim.press_at(period, Key::Char('a'));
    rig.sim.press_at(period * 2, Key::Char('l'));

    let outcome = rig.run(TrialKind::Experiment { block: 0 }).unwrap();
    assert_eq!(outcome.response, Response::Timeout);
}

#[test]
fn unmapped_keys_are_ignored_during_the_window() {
    let mut rig = Rig::new(&["X"]);
    rig.sim.respond(Key::Char('q'), Duration::ZERO);
    let outcome = rig.run(TrialKind::Experiment { block: 0 }).unwrap();
    assert_eq!(outcome.response, Response::Timeout);
}

#[test]
fn reaction_times_stay_inside_the_window() {
    let mut rig = Rig::new(&["X", "C C X C C"]);
    let window = rig.window();
    let step = window / 10;
    let mut delays = (0..10).map(move |i| step * i);
    rig.sim
        .respond_with(move |_| delays.next().map(|d| (Key::Char('a'), d)));

    for _ in 0..10 {
        let outcome = rig.run(TrialKind::Experiment { block: 0 }).unwrap();
        match outcome.response {
            Response::Pressed { reaction_time, .. } => assert!(reaction_time <= window),
            Response::Timeout => panic!("response inside the window timed out"),
        }
    }
}

#[test]
fn press_during_the_last_stimulus_frame_counts() {
    let mut rig = Rig::new(&["X"]);
    let period = rig.sim.period();
    let delay = Duration::from_nanos(period * u64::from(WINDOW - 1) + period / 2);
    rig.sim.respond(Key::Char('a'), delay);

    let outcome = rig.run(TrialKind::Experiment { block: 0 }).unwrap();
    assert_eq!(
        outcome.response,
        Response::Pressed {
            key: Key::Char('a'),
            reaction_time: delay,
        }
    );
    assert!(delay < rig.window());
    // the offset frame is where the press is picked up
    assert_eq!(rig.sim.frames().len(), (FIXATION + WINDOW + 1) as usize);
}

#[test]
fn press_at_stimulus_offset_is_a_timeout() {
    let mut rig = Rig::new(&["X"]);
    let window = rig.window();
    rig.sim.respond(Key::Char('a'), window);

    let outcome = rig.run(TrialKind::Experiment { block: 0 }).unwrap();
    assert_eq!(outcome.response, Response::Timeout);
}

#[test]
fn exit_in_the_last_fixation_frame_aborts() {
    let mut rig = Rig::new(&["X"]);
    let period = rig.sim.period();
    rig.sim.press_at(period * u64::from(FIXATION), Key::EXIT);

    let err = rig.run(TrialKind::Experiment { block: 0 }).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Aborted(AbortReason::ExitKey(Key::Escape))
    ));
    assert_eq!(rig.sim.frames().len(), FIXATION as usize);
}

#[test]
fn exit_in_the_offset_frame_aborts() {
    let mut rig = Rig::new(&["X"]);
    let period = rig.sim.period();
    rig.sim
        .press_at(period * u64::from(FIXATION + WINDOW + 1), Key::EXIT);
    assert!(rig.run(TrialKind::Experiment { block: 0 }).unwrap_err().is_abort());
}

#[test]
fn training_shows_feedback_then_break() {
    let mut rig = Rig::new(&["X"]);
    rig.sim.respond(Key::Char('a'), Duration::from_millis(20));

    let outcome = rig.run(TrialKind::Training).unwrap();
    assert_eq!(
        outcome.kind,
        RecordKind::Training {
            verdict: Verdict::Correct
        }
    );

    let presented = rig.sim.frames();
    let tail = &presented[presented.len() - (FEEDBACK + BREAK) as usize..];
    for frame in &tail[..FEEDBACK as usize] {
        assert_eq!(frame.feedback(), Some("Poprawnie"));
        assert!(frame.has(&Draw::Reminder));
    }
    for frame in &tail[FEEDBACK as usize..] {
        assert_eq!(frame.draws, vec![Draw::Reminder]);
    }
}

#[test]
fn training_timeout_is_no_response() {
    let mut rig = Rig::new(&["- - V - -"]);
    let outcome = rig.run(TrialKind::Training).unwrap();

    assert_eq!(outcome.response.reaction_time_secs(), -1.0);
    assert_eq!(outcome.kind.verdict(), Some(Verdict::NoResponse));
    let presented = rig.sim.frames();
    assert_eq!(
        presented.len(),
        (FIXATION + WINDOW + 1 + FEEDBACK + BREAK) as usize
    );
    assert!(
        presented
            .iter()
            .any(|f| f.feedback() == Some("Nie wciśnięto żadnego przycisku!"))
    );
}

#[test]
fn experiment_trials_skip_feedback() {
    let mut rig = Rig::new(&["X"]);
    rig.sim.respond(Key::Char('l'), Duration::ZERO);
    rig.run(TrialKind::Experiment { block: 2 }).unwrap();
    assert!(rig.sim.frames().iter().all(|f| f.feedback().is_none()));
}

#[test]
fn exit_during_stimulus_aborts_the_trial() {
    let mut rig = Rig::new(&["X"]);
    rig.sim.exit_at_onset(1);
    let err = rig.run(TrialKind::Training).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Aborted(AbortReason::ExitKey(Key::Escape))
    ));
    assert_eq!(rig.sim.frames().len(), FIXATION as usize + 1);
}

#[test]
fn exit_during_feedback_aborts_the_trial() {
    let mut rig = Rig::new(&["X"]);
    rig.sim.respond(Key::Char('a'), Duration::ZERO);
    rig.sim.on_frame(|frame| match frame.feedback() {
        Some(_) => vec![(frame.at, Key::EXIT)],
        None => Vec::new(),
    });
    assert!(rig.run(TrialKind::Training).unwrap_err().is_abort());
}

#[test]
fn settings_follow_the_config() {
    let config = ExperimentConfig {
        frame_rate: 60,
        feedback_secs: 2.0,
        ..ExperimentConfig::default()
    };
    let settings = TrialSettings::from(&config);
    assert_eq!(settings.feedback_frames, 120);
    assert_eq!(settings.stimulus_frames, config.stimulus_frames);
}
