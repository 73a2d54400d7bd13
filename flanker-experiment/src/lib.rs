pub mod classify;
pub mod config;
pub mod csv_sink;
pub mod error;
pub mod frames;
pub mod input;
pub mod messages;
pub mod results;
pub mod screen;
pub mod selector;
pub mod session;
pub mod trial;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::ResponseMapping;
pub use config::{ConfigError, ExperimentConfig, load_config};
pub use csv_sink::CsvSink;
pub use error::{AbortReason, SessionError};
pub use frames::Frames;
pub use input::{InputPoller, KeyPress, KeyQueue};
pub use messages::{MessageError, MessageTemplate, Messages};
pub use results::{ResultsGuard, ResultsLog, ResultsSink, RunStatus, SessionMeta, SinkError};
pub use screen::{DisplayError, Screen};
pub use selector::StimulusSelector;
pub use session::{SessionManager, SessionOutcome, SessionReport};
pub use trial::{TrialKind, TrialRunner, TrialSettings, TrialState};
