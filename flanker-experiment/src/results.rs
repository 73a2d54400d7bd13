//! In-memory results log and its crash-safe persistence.

use flanker_core::{FeedbackLabels, HEADER, ParticipantId, TrialOutcome, TrialRecord};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("results I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("results CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("session summary encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Aborted(String),
    Failed(String),
}

/// Session-level facts written next to the trial rows.
#[derive(Debug, Clone, Serialize)]
pub struct SessionMeta {
    pub participant: ParticipantId,
    pub expected_frame_rate: u32,
    pub detected_frame_rate: Option<u32>,
    pub frame_jitter_ms: Option<f64>,
    pub resolution: Option<(u32, u32)>,
    pub trials_recorded: usize,
    #[serde(flatten)]
    pub status: RunStatus,
}

/// Append-only list of trial records for one participant.
///
/// Trial numbers are assigned here, starting at 1 and continuing across
/// training and experiment.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    labels: FeedbackLabels,
    records: Vec<TrialRecord>,
    meta: SessionMeta,
}

impl ResultsLog {
    pub fn new(participant: ParticipantId, labels: FeedbackLabels, expected_frame_rate: u32) -> Self {
        Self {
            labels,
            records: Vec::new(),
            meta: SessionMeta {
                participant,
                expected_frame_rate,
                detected_frame_rate: None,
                frame_jitter_ms: None,
                resolution: None,
                trials_recorded: 0,
                status: RunStatus::Running,
            },
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.meta.participant
    }

    pub fn next_trial_no(&self) -> u32 {
        self.records.len() as u32 + 1
    }

    pub fn record(&mut self, outcome: TrialOutcome) -> &TrialRecord {
        let record = TrialRecord::new(self.meta.participant.clone(), self.next_trial_no(), outcome);
        self.records.push(record);
        self.meta.trials_recorded = self.records.len();
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut SessionMeta {
        &mut self.meta
    }

    /// Header followed by one row per record, in recording order.
    pub fn rows(&self) -> Vec<Vec<String>> {
        std::iter::once(HEADER.iter().map(|h| h.to_string()).collect())
            .chain(self.records.iter().map(|r| r.to_row(&self.labels)))
            .collect()
    }
}

/// Durable storage for a results log.
pub trait ResultsSink {
    /// Writes the whole log, replacing anything this sink wrote before.
    fn persist(&mut self, log: &ResultsLog) -> Result<PathBuf, SinkError>;
}

/// Owns the log for the length of a session and persists it when dropped,
/// so an abort, an error or a panic still leaves the data on disk.
pub struct ResultsGuard<K: ResultsSink> {
    log: ResultsLog,
    sink: K,
    dirty: bool,
}

impl<K: ResultsSink> ResultsGuard<K> {
    pub fn new(log: ResultsLog, sink: K) -> Self {
        Self {
            log,
            sink,
            dirty: true,
        }
    }

    pub fn log(&self) -> &ResultsLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ResultsLog {
        self.dirty = true;
        &mut self.log
    }

    pub fn record(&mut self, outcome: TrialOutcome) -> &TrialRecord {
        self.dirty = true;
        self.log.record(outcome)
    }

    pub fn set_status(&mut self, status: RunStatus) {
        self.log_mut().meta_mut().status = status;
    }

    pub fn persist(&mut self) -> Result<PathBuf, SinkError> {
        let path = self.sink.persist(&self.log)?;
        self.dirty = false;
        info!(path = %path.display(), trials = self.log.len(), "results saved");
        Ok(path)
    }

    /// Final save. The guard does not retry on drop if this fails.
    pub fn finish(mut self) -> Result<PathBuf, SinkError> {
        let result = self.persist();
        self.dirty = false;
        result
    }
}

impl<K: ResultsSink> Drop for ResultsGuard<K> {
    fn drop(&mut self) {
        if !self.dirty {
            return;
        }
        if std::thread::panicking() && self.log.meta.status == RunStatus::Running {
            self.log.meta.status = RunStatus::Failed("panicked".to_string());
        }
        if let Err(err) = self.persist() {
            error!(%err, trials = self.log.len(), "failed to save results");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySink;
    use flanker_core::{Key, RecordKind, Response, Verdict};
    use std::time::Duration;

    fn log() -> ResultsLog {
        ResultsLog::new(ParticipantId::new("P01"), FeedbackLabels::default(), 60)
    }

    fn training(verdict: Verdict) -> TrialOutcome {
        TrialOutcome {
            stimulus: "X".to_string(),
            response: Response::Pressed {
                key: Key::Char('a'),
                reaction_time: Duration::from_millis(250),
            },
            kind: RecordKind::Training { verdict },
        }
    }

    fn experiment(block: u32) -> TrialOutcome {
        TrialOutcome {
            stimulus: "B B X B B".to_string(),
            response: Response::Timeout,
            kind: RecordKind::Experiment { block },
        }
    }

    #[test]
    fn numbers_trials_across_sessions() {
        let mut log = log();
        log.record(training(Verdict::Correct));
        log.record(training(Verdict::Incorrect));
        let rec = log.record(experiment(0));
        assert_eq!(rec.trial_no, 3);
        assert_eq!(log.meta().trials_recorded, 3);

        let rows = log.rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], HEADER.map(String::from).to_vec());
        assert_eq!(rows[1].len(), 8);
        assert_eq!(rows[3].len(), 7);
        assert_eq!(rows[3][2], "3");
    }

    #[test]
    fn empty_log_is_header_only() {
        assert_eq!(log().rows().len(), 1);
    }

    #[test]
    fn guard_persists_on_drop() {
        let sink = MemorySink::default();
        {
            let mut guard = ResultsGuard::new(log(), sink.clone());
            guard.record(training(Verdict::Correct));
            guard.set_status(RunStatus::Aborted("esc".to_string()));
        }
        let saved = sink.last();
        assert_eq!(saved.rows.len(), 2);
        assert_eq!(saved.status, RunStatus::Aborted("esc".to_string()));
    }

    #[test]
    fn guard_skips_drop_after_explicit_persist() {
        let sink = MemorySink::default();
        {
            let mut guard = ResultsGuard::new(log(), sink.clone());
            guard.record(experiment(1));
            guard.persist().unwrap();
        }
        assert_eq!(sink.saves().len(), 1);

        {
            let mut guard = ResultsGuard::new(log(), sink.clone());
            guard.persist().unwrap();
            guard.record(experiment(1));
        }
        assert_eq!(sink.saves().len(), 3);
        assert_eq!(sink.last().rows.len(), 2);
    }

    #[test]
    fn finish_saves_exactly_once() {
        let sink = MemorySink::default();
        let mut guard = ResultsGuard::new(log(), sink.clone());
        guard.record(training(Verdict::Correct));
        guard.set_status(RunStatus::Completed);
        assert_eq!(guard.finish().unwrap(), PathBuf::from("memory"));
        assert_eq!(sink.saves().len(), 1);
        assert_eq!(sink.last().status, RunStatus::Completed);
    }

    #[test]
    fn guard_marks_panics_as_failures() {
        let sink = MemorySink::default();
        let inner = sink.clone();
        let joined = std::thread::spawn(move || {
            let mut guard = ResultsGuard::new(log(), inner);
            guard.record(training(Verdict::NoResponse));
            panic!("display lost");
        })
        .join();
        assert!(joined.is_err());
        assert_eq!(sink.last().status, RunStatus::Failed("panicked".to_string()));
    }

    #[test]
    fn meta_serializes_status_inline() {
        let mut log = log();
        log.meta_mut().status = RunStatus::Aborted("Esc".to_string());
        let json = serde_json::to_value(log.meta()).unwrap();
        assert_eq!(json["status"], "aborted");
        assert_eq!(json["reason"], "Esc");
        assert_eq!(json["participant"], "P01");
        assert_eq!(json["expected_frame_rate"], 60);
    }
}
