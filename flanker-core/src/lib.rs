pub mod key;
pub mod participant;
pub mod phase;
pub mod stimulus;
pub mod style;
pub mod trial;

pub use key::{Key, KeyError, KeyPressed};
pub use participant::ParticipantId;
pub use phase::SessionPhase;
pub use stimulus::{SHORT_STIMULUS_MAX_LEN, target_char, target_index};
pub use style::{Color, ColorError, StyleConfig};
pub use trial::{FeedbackLabels, HEADER, RecordKind, Response, TrialOutcome, TrialRecord, Verdict};
