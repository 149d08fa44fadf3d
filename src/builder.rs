//! Constituent trees from shallow-parser output
//!
//! A sentence arrives as (token, POS, chunk) triples. POS tags may be
//! compound, joined with `__` ("N__NN"), and chunk tags follow the BIO
//! scheme. Each "B-" tag opens a CHUNK constituent and each POS sub-tag
//! opens one labeled layer above the token.
//!
//! The bracket bookkeeping closes exactly two layers after every token no
//! matter how many sub-tags it opened. Two-part POS chains, which is what
//! the Malayalam tagger emits, come out balanced. Other chain lengths
//! leave layers open across tokens or close layers the token never opened;
//! when the text ends up unbalanced the bracket parser rejects it.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::bracket::parse_tree;
use crate::error::{Error, Result};
use crate::tree::{CHUNK_LABEL, ParseTree, SENTENCE_LABEL, SentenceForest, escape_token};

/// Separator between the parts of a compound POS tag
pub const POS_CHAIN_SEPARATOR: &str = "__";

/// Marker inside a chunk tag that opens a new chunk
pub const CHUNK_BEGIN: &str = "B-";

/// One token of shallow-parser output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub token: String,
    pub pos: String,
    pub chunk: String,
}

impl TaggedToken {
    pub fn new(token: &str, pos: &str, chunk: &str) -> Self {
        Self {
            token: token.to_string(),
            pos: pos.to_string(),
            chunk: chunk.to_string(),
        }
    }

    /// Individual tags of a compound POS tag, outermost first
    pub fn pos_chain(&self) -> impl Iterator<Item = &str> {
        self.pos.split(POS_CHAIN_SEPARATOR)
    }

    pub fn begins_chunk(&self) -> bool {
        self.chunk.contains(CHUNK_BEGIN)
    }
}

impl<T: AsRef<str>, P: AsRef<str>, C: AsRef<str>> From<(T, P, C)> for TaggedToken {
    fn from((token, pos, chunk): (T, P, C)) -> Self {
        Self::new(token.as_ref(), pos.as_ref(), chunk.as_ref())
    }
}

/// Render one sentence as bracket text
pub fn to_bracketed(sentence: &[TaggedToken]) -> String {
    let mut text = format!("( {} ", SENTENCE_LABEL);
    // Layers still open, counting the root
    let mut open: i64 = 1;

    for tagged in sentence {
        if tagged.begins_chunk() {
            if open > 1 {
                push_closes(&mut text, open - 1);
                open = 1;
            }
            text.push_str(" ( ");
            text.push_str(CHUNK_LABEL);
            text.push(' ');
            open += 1;
        }

        for tag in tagged.pos_chain() {
            text.push_str(" ( ");
            text.push_str(tag);
            open += 1;
        }

        text.push(' ');
        text.push_str(&escape_token(&tagged.token));
        push_closes(&mut text, 2);
        open -= 2;
    }

    push_closes(&mut text, open);
    text
}

fn push_closes(text: &mut String, count: i64) {
    for _ in 0..count.max(0) {
        text.push_str(" ) ");
    }
}

/// Build the constituent tree for one sentence
pub fn build_tree(sentence: &[TaggedToken]) -> Result<ParseTree> {
    parse_tree(&to_bracketed(sentence))
}

/// Build the trees of a whole document
///
/// A sentence whose tree cannot be built is left as a gap in the forest
/// and its error, tagged with the sentence index, is returned alongside.
pub fn build_forest(sentences: &[Vec<TaggedToken>]) -> (SentenceForest, Vec<Error>) {
    let mut forest = SentenceForest::new();
    let mut skipped = Vec::new();

    for (index, sentence) in sentences.iter().enumerate() {
        match build_tree(sentence) {
            Ok(tree) => {
                forest.push(tree);
            }
            Err(e) => {
                let e = e.in_sentence(index);
                warn!("skipping sentence: {}", e);
                forest.push_gap();
                skipped.push(e);
            }
        }
    }

    (forest, skipped)
}
