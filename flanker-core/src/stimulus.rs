//! Flanker stimulus layout.
//!
//! A stimulus is a plain string. Short stimuli (up to five characters) carry
//! the target first; longer ones carry it at position four, with flankers
//! around it. The position depends on the length alone.

/// Longest stimulus that still carries its target at position zero.
pub const SHORT_STIMULUS_MAX_LEN: usize = 5;

const SHORT_TARGET_INDEX: usize = 0;
const LONG_TARGET_INDEX: usize = 4;

/// Character index of the target within `stimulus`.
pub fn target_index(stimulus: &str) -> usize {
    if stimulus.chars().count() <= SHORT_STIMULUS_MAX_LEN {
        SHORT_TARGET_INDEX
    } else {
        LONG_TARGET_INDEX
    }
}

/// The target character, if the stimulus is long enough to have one.
pub fn target_char(stimulus: &str) -> Option<char> {
    stimulus.chars().nth(target_index(stimulus))
}
