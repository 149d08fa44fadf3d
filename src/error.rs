//! Error types
//!
//! Structural errors are fatal for one sentence only. Lookup failures and
//! search exhaustion are not errors at all; they show up as missing entries
//! in the resolution result.

use thiserror::Error;

use crate::bracket::Rule;

/// Errors raised while building trees, reading tagger output, or loading
/// configuration
#[derive(Debug, Error)]
pub enum Error {
    #[error("Bracket syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("Constituent '{label}' has no children")]
    EmptyConstituent { label: String },

    #[error("Constituent '{label}' has more than one bare word or sits at the root with one")]
    MixedConstituent { label: String },

    #[error("Tree root must be labeled S, found '{label}'")]
    BadRoot { label: String },

    #[error("Sentence {index}: {source}")]
    Sentence {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Sentence {index}: tagger failed: {message}")]
    Tagger { index: usize, message: String },

    #[error("Column error at line {line_num}: {message}")]
    Column { line_num: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Attach a sentence index to a structural error
    pub fn in_sentence(self, index: usize) -> Self {
        match self {
            Error::Sentence { .. } | Error::Tagger { .. } => self,
            other => Error::Sentence {
                index,
                source: Box::new(other),
            },
        }
    }

    /// Sentence index this error is attached to, if any
    pub fn sentence_index(&self) -> Option<usize> {
        match self {
            Error::Sentence { index, .. } | Error::Tagger { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl From<pest::error::Error<Rule>> for Error {
    fn from(err: pest::error::Error<Rule>) -> Self {
        Error::Syntax(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
