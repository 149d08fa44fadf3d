//! Closed-class word tables and pronoun classification
//!
//! The search strategy depends on what kind of pronoun is being resolved.
//! The word lists live in a `Lexicon` that callers pass in explicitly, so a
//! different language variant only needs a different table.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Coarse pronoun category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PronounClass {
    Locative,
    Reflexive,
    Personal,
    Demonstrative,
    Other,
}

impl PronounClass {
    pub fn as_str(self) -> &'static str {
        match self {
            PronounClass::Locative => "locative",
            PronounClass::Reflexive => "reflexive",
            PronounClass::Personal => "personal",
            PronounClass::Demonstrative => "demonstrative",
            PronounClass::Other => "other",
        }
    }
}

impl fmt::Display for PronounClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed-class vocabulary for one language
///
/// Every field is optional when loading from JSON; missing fields keep the
/// Malayalam defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Place pronouns ("here", "there")
    pub locative: FxHashSet<String>,
    /// Suffix marking a reflexive form
    pub reflexive_suffix: String,
    pub personal: FxHashSet<String>,
    pub demonstrative: FxHashSet<String>,
    /// Case values accepted on an antecedent
    pub nominative_cases: FxHashSet<String>,
    /// POS tag prefix that marks a token as a pronoun
    pub pronoun_pos_prefix: String,
}

impl Lexicon {
    /// Built-in Malayalam table
    pub fn malayalam() -> Self {
        Self {
            locative: word_set(&["ഇവിടെ", "അവിടെ"]),
            reflexive_suffix: "തന്നെ".to_string(),
            personal: word_set(&["അവൻ", "അവൾ", "അവർ", "അവള്", "അവന്\u{200d}"]),
            demonstrative: word_set(&["ഇത്", "അത്", "ഇവ", "അവ"]),
            nominative_cases: word_set(&["nom"]),
            pronoun_pos_prefix: "PR__PRP".to_string(),
        }
    }

    /// Load a table from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Classify a pronoun by surface form; first matching rule wins
    pub fn classify(&self, token: &str) -> PronounClass {
        if self.locative.contains(token) {
            PronounClass::Locative
        } else if !self.reflexive_suffix.is_empty() && token.ends_with(&self.reflexive_suffix) {
            PronounClass::Reflexive
        } else if self.personal.contains(token) {
            PronounClass::Personal
        } else if self.demonstrative.contains(token) {
            PronounClass::Demonstrative
        } else {
            PronounClass::Other
        }
    }

    pub fn is_nominative(&self, case: &str) -> bool {
        self.nominative_cases.contains(case)
    }

    /// Whether a POS tag marks a pronoun token
    pub fn is_pronoun_tag(&self, pos: &str) -> bool {
        pos.starts_with(&self.pronoun_pos_prefix)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::malayalam()
    }
}

fn word_set(words: &[&str]) -> FxHashSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}
