use crate::config::ConfigError;
use rand::Rng;

/// Uniform draw, with replacement, from the configured stimulus set.
#[derive(Debug, Clone)]
pub struct StimulusSelector<R: Rng> {
    stimuli: Vec<String>,
    rng: R,
}

impl<R: Rng> StimulusSelector<R> {
    pub fn new(stimuli: Vec<String>, rng: R) -> Result<Self, ConfigError> {
        if stimuli.is_empty() {
            return Err(ConfigError::NoStimuli);
        }
        Ok(Self { stimuli, rng })
    }

    pub fn select(&mut self) -> &str {
        let idx = self.rng.random_range(0..self.stimuli.len());
        &self.stimuli[idx]
    }

    pub fn stimuli(&self) -> &[String] {
        &self.stimuli
    }
}
