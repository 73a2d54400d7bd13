use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A keyboard key as it is named in the config file and in the results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    Char(char),
    Space,
    Escape,
    Enter,
}

impl Key {
    /// Cancels the whole session from any frame loop.
    pub const EXIT: Key = Key::Escape;
    /// Advances past instruction screens.
    pub const CONTINUE: Key = Key::Space;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("empty key name")]
    Empty,
    #[error("unknown key name `{0}`")]
    Unknown(String),
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        match name.to_ascii_lowercase().as_str() {
            "" => Err(KeyError::Empty),
            "esc" | "escape" => Ok(Key::Escape),
            "space" => Ok(Key::Space),
            "return" | "enter" => Ok(Key::Enter),
            lower => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Key::Char(c)),
                    _ => Err(KeyError::Unknown(name.to_string())),
                }
            }
        }
    }
}

impl TryFrom<String> for Key {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c}"),
            Key::Space => f.write_str("space"),
            Key::Escape => f.write_str("esc"),
            Key::Enter => f.write_str("return"),
        }
    }
}

/// Content of the `Key_pressed` column: a key, or the no-response sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPressed {
    Key(Key),
    NoKey,
}

impl KeyPressed {
    pub const NO_KEY: &'static str = "no_key";
}

impl fmt::Display for KeyPressed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPressed::Key(key) => key.fmt(f),
            KeyPressed::NoKey => f.write_str(Self::NO_KEY),
        }
    }
}
