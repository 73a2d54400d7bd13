use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Participant identifier, fixed once the session starts.
///
/// Treated as opaque: whatever collected the fields already validated them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ParticipantId(Arc<str>);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(Arc::from(id.into()))
    }

    /// Joins the identity form fields in order: identifier, sex, age.
    pub fn from_fields(identifier: &str, sex: &str, age: &str) -> Self {
        Self::new(format!("{identifier}{sex}{age}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
