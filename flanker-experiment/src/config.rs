use flanker_core::{FeedbackLabels, Key, StyleConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("FRAME_RATE must be positive")]
    FrameRate,
    #[error("STIM_TIME must be at least one frame")]
    StimulusWindow,
    #[error("STIM_TYPES must list at least one stimulus")]
    NoStimuli,
    #[error("REACTION_KEYS must hold exactly two keys, got {0}")]
    ReactionKeyCount(usize),
    #[error("REACTION_KEYS must be two different keys")]
    DuplicateReactionKey,
    #[error("`{0}` is reserved and cannot be a reaction key")]
    ReservedKey(Key),
    #[error("FEEDBACK_TIME must be a non-negative number of seconds")]
    FeedbackTime,
}

/// Experiment parameters, read once before the session starts.
///
/// Durations are frame counts at `FRAME_RATE`, except `FEEDBACK_TIME`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(rename = "FRAME_RATE")]
    pub frame_rate: u32,
    #[serde(rename = "FIX_CROSS_TIME")]
    pub fixation_frames: u32,
    #[serde(rename = "STIM_TIME")]
    pub stimulus_frames: u32,
    #[serde(rename = "BREAK_TIME")]
    pub break_frames: u32,
    #[serde(rename = "NO_TRAINING_TRIALS")]
    pub training_trials: u32,
    #[serde(rename = "NO_BLOCKS")]
    pub blocks: u32,
    #[serde(rename = "INTRA_BLOCK_TRAINIG")]
    pub trials_per_block: u32,
    #[serde(rename = "STIM_TYPES")]
    pub stimuli: Vec<String>,
    #[serde(rename = "REACTION_KEYS")]
    pub reaction_keys: Vec<Key>,
    #[serde(rename = "FEEDBACK_TIME", default = "default_feedback_secs")]
    pub feedback_secs: f64,
    #[serde(rename = "CALIBRATION_FRAMES", default = "default_calibration_frames")]
    pub calibration_frames: u32,
    #[serde(rename = "FEEDBACK_LABELS", default)]
    pub feedback_labels: FeedbackLabels,
    #[serde(rename = "MESSAGES_DIR", default = "default_messages_dir")]
    pub messages_dir: PathBuf,
    #[serde(rename = "RESULTS_DIR", default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(flatten)]
    pub style: StyleConfig,
}

fn default_feedback_secs() -> f64 {
    2.0
}

fn default_calibration_frames() -> u32 {
    60
}

fn default_messages_dir() -> PathBuf {
    PathBuf::from("messages")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            fixation_frames: 60,
            stimulus_frames: 120,
            break_frames: 60,
            training_trials: 10,
            blocks: 3,
            trials_per_block: 20,
            stimuli: [
                "X", "C", "B", "V", "X X X X X", "C C C C C", "B B B B B", "V V V V V",
                "B B X B B", "V V C V V", "X X B X X", "C C V C C",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            reaction_keys: vec![Key::Char('a'), Key::Char('l')],
            feedback_secs: default_feedback_secs(),
            calibration_frames: default_calibration_frames(),
            feedback_labels: FeedbackLabels::default(),
            messages_dir: default_messages_dir(),
            results_dir: default_results_dir(),
            style: StyleConfig::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 {
            return Err(ConfigError::FrameRate);
        }
        if self.stimulus_frames == 0 {
            return Err(ConfigError::StimulusWindow);
        }
        if self.stimuli.is_empty() {
            return Err(ConfigError::NoStimuli);
        }
        if !self.feedback_secs.is_finite() || self.feedback_secs < 0.0 {
            return Err(ConfigError::FeedbackTime);
        }
        match self.reaction_keys.as_slice() {
            [first, second] => {
                if first == second {
                    return Err(ConfigError::DuplicateReactionKey);
                }
                for key in [first, second] {
                    if *key == Key::EXIT || *key == Key::CONTINUE {
                        return Err(ConfigError::ReservedKey(key.clone()));
                    }
                }
            }
            keys => return Err(ConfigError::ReactionKeyCount(keys.len())),
        }
        Ok(())
    }

    /// Feedback duration converted to whole frames.
    pub fn feedback_frames(&self) -> u32 {
        (self.feedback_secs * f64::from(self.frame_rate)).round() as u32
    }

    /// Number of trials a complete session records.
    pub fn total_trials(&self) -> u32 {
        self.training_trials + self.blocks * self.trials_per_block
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExperimentConfig, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ExperimentConfig = serde_yaml::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}
