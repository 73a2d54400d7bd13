use crate::key::{Key, KeyPressed};
use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Results header, always the first row of a results log.
pub const HEADER: [&str; 8] = [
    "PART_ID",
    "Block_no",
    "Trial_no",
    "Session_name",
    "Reaction_time",
    "Key_pressed",
    "Stimulus_type",
    "Corr_in_trial",
];

/// Correctness of a training response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Correct,
    Incorrect,
    NoResponse,
}

/// Texts shown as feedback and written to `Corr_in_trial`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackLabels {
    pub correct: String,
    pub incorrect: String,
    pub no_response: String,
}

impl Default for FeedbackLabels {
    fn default() -> Self {
        Self {
            correct: "Poprawnie".to_string(),
            incorrect: "Niepoprawnie".to_string(),
            no_response: "Nie wciśnięto żadnego przycisku!".to_string(),
        }
    }
}

impl FeedbackLabels {
    pub fn label(&self, verdict: Verdict) -> &str {
        match verdict {
            Verdict::Correct => &self.correct,
            Verdict::Incorrect => &self.incorrect,
            Verdict::NoResponse => &self.no_response,
        }
    }
}

/// How a trial's response window ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Pressed { key: Key, reaction_time: Duration },
    Timeout,
}

impl Response {
    /// `Reaction_time` written for a timeout.
    pub const TIMEOUT_SENTINEL: f64 = -1.0;

    pub fn key_pressed(&self) -> KeyPressed {
        match self {
            Response::Pressed { key, .. } => KeyPressed::Key(key.clone()),
            Response::Timeout => KeyPressed::NoKey,
        }
    }

    /// Seconds from stimulus onset, or the timeout sentinel.
    pub fn reaction_time_secs(&self) -> f64 {
        match self {
            Response::Pressed { reaction_time, .. } => reaction_time.as_secs_f64(),
            Response::Timeout => Self::TIMEOUT_SENTINEL,
        }
    }
}

/// Block membership of a record. Training records carry a verdict,
/// experiment records carry their block and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Training { verdict: Verdict },
    Experiment { block: u32 },
}

impl RecordKind {
    /// `Block_no` column: -1 for training, 0-indexed block otherwise.
    pub fn block_no(&self) -> i64 {
        match self {
            RecordKind::Training { .. } => -1,
            RecordKind::Experiment { block } => i64::from(*block),
        }
    }

    pub fn session_name(&self) -> &'static str {
        match self {
            RecordKind::Training { .. } => "training",
            RecordKind::Experiment { .. } => "experiment",
        }
    }

    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            RecordKind::Training { verdict } => Some(*verdict),
            RecordKind::Experiment { .. } => None,
        }
    }
}

/// What a finished trial hands back before it is numbered and stamped.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub stimulus: String,
    pub response: Response,
    pub kind: RecordKind,
}

/// One row of the results log.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub participant: ParticipantId,
    pub trial_no: u32,
    pub stimulus: String,
    pub response: Response,
    pub kind: RecordKind,
}

impl TrialRecord {
    pub fn new(participant: ParticipantId, trial_no: u32, outcome: TrialOutcome) -> Self {
        Self {
            participant,
            trial_no,
            stimulus: outcome.stimulus,
            response: outcome.response,
            kind: outcome.kind,
        }
    }

    /// Eight fields for training rows, seven for experiment rows.
    pub fn to_row(&self, labels: &FeedbackLabels) -> Vec<String> {
        let mut row = vec![
            self.participant.to_string(),
            self.kind.block_no().to_string(),
            self.trial_no.to_string(),
            self.kind.session_name().to_string(),
            format!("{:?}", self.response.reaction_time_secs()),
            self.response.key_pressed().to_string(),
            self.stimulus.clone(),
        ];
        if let Some(verdict) = self.kind.verdict() {
            row.push(labels.label(verdict).to_string());
        }
        row
    }
}
