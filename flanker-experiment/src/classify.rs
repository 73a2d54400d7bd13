use crate::config::ConfigError;
use flanker_core::{Key, KeyPressed, Verdict, target_char};

const FIRST_KEY_TARGETS: [char; 2] = ['X', 'C'];
const SECOND_KEY_TARGETS: [char; 2] = ['B', 'V'];

/// Congruency rule: the first reaction key answers X/C targets, the second
/// answers B/V targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMapping {
    first: Key,
    second: Key,
}

impl ResponseMapping {
    pub fn new(first: Key, second: Key) -> Self {
        Self { first, second }
    }

    pub fn from_keys(keys: &[Key]) -> Result<Self, ConfigError> {
        match keys {
            [first, second] if first != second => Ok(Self::new(first.clone(), second.clone())),
            [_, _] => Err(ConfigError::DuplicateReactionKey),
            other => Err(ConfigError::ReactionKeyCount(other.len())),
        }
    }

    /// Keys accepted during the response window.
    pub fn keys(&self) -> [Key; 2] {
        [self.first.clone(), self.second.clone()]
    }

    pub fn classify(&self, pressed: &KeyPressed, stimulus: &str) -> Verdict {
        let KeyPressed::Key(key) = pressed else {
            return Verdict::NoResponse;
        };
        let Some(target) = target_char(stimulus) else {
            return Verdict::Incorrect;
        };
        let targets: &[char] = if *key == self.first {
            &FIRST_KEY_TARGETS
        } else if *key == self.second {
            &SECOND_KEY_TARGETS
        } else {
            &[]
        };
        if targets.contains(&target) {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }
}
