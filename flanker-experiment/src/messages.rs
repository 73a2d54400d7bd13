//! Instruction texts shown between phases.
//!
//! Message files are UTF-8. Lines starting with `#` are comments. A line
//! starting with `<--insert-->` marks where dynamic text goes; it is dropped
//! when nothing is inserted.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const COMMENT: &str = "#";
const INSERT_MARKER: &str = "<--insert-->";

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("message path `{0}` does not name a file")]
    InvalidName(PathBuf),
    #[error("failed to read message file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Text(String),
    Insert,
}

/// A parsed message file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    lines: Vec<Line>,
}

impl MessageTemplate {
    pub fn parse(raw: &str) -> Self {
        let lines = raw
            .split_inclusive('\n')
            .filter(|line| !line.starts_with(COMMENT))
            .map(|line| {
                if line.starts_with(INSERT_MARKER) {
                    Line::Insert
                } else {
                    Line::Text(line.to_string())
                }
            })
            .collect();
        Self { lines }
    }

    pub fn load(path: &Path) -> Result<Self, MessageError> {
        if path.file_name().is_none() {
            return Err(MessageError::InvalidName(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|source| MessageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&raw))
    }

    /// Renders the text, putting `insert` at every marker line.
    pub fn render(&self, insert: Option<&str>) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Text(text) => out.push_str(text),
                Line::Insert => {
                    if let Some(insert) = insert.filter(|s| !s.is_empty()) {
                        out.push_str(insert);
                    }
                }
            }
        }
        out
    }
}

/// The full set of screens a session shows.
#[derive(Debug, Clone)]
pub struct Messages {
    pub hello: MessageTemplate,
    pub before_training: MessageTemplate,
    pub reminder: MessageTemplate,
    pub before_experiment: MessageTemplate,
    pub block_break: MessageTemplate,
    pub end: MessageTemplate,
}

impl Messages {
    pub const FILES: [&'static str; 6] = [
        "hello.txt",
        "before_training.txt",
        "reminder.txt",
        "before_experiment.txt",
        "break.txt",
        "end.txt",
    ];

    /// Loads every message up front so a missing file fails before the
    /// first trial rather than in the middle of the session.
    pub fn load_dir(dir: &Path) -> Result<Self, MessageError> {
        let load = |name: &str| MessageTemplate::load(&dir.join(name));
        Ok(Self {
            hello: load("hello.txt")?,
            before_training: load("before_training.txt")?,
            reminder: load("reminder.txt")?,
            before_experiment: load("before_experiment.txt")?,
            block_break: load("break.txt")?,
            end: load("end.txt")?,
        })
    }
}
