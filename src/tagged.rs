//! Shallow-parser output reading
//!
//! The tagging pipeline writes one token per line in tab-separated columns,
//! CRF++ style: the surface token first, then feature columns, then the POS
//! tag and the chunk tag as the last two columns. A blank line ends a
//! sentence.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::builder::TaggedToken;
use crate::error::{Error, Result};
use crate::lexicon::Lexicon;

/// Sentence index to the token indices of its pronouns, both ascending
pub type PronounIndexMap = BTreeMap<usize, Vec<usize>>;

/// Reader that yields one tagged sentence at a time
pub struct TaggedReader<R: BufRead> {
    lines: Lines<R>,
    line_num: usize,
}

impl TaggedReader<BufReader<File>> {
    /// Create a reader from a file path
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl TaggedReader<BufReader<std::io::Cursor<String>>> {
    /// Create a reader from a string
    pub fn from_string(text: &str) -> Self {
        Self::new(BufReader::new(std::io::Cursor::new(text.to_string())))
    }
}

impl<R: BufRead> TaggedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }
}

impl<R: BufRead> Iterator for TaggedReader<R> {
    type Item = Result<Vec<TaggedToken>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut sentence = Vec::new();

        loop {
            self.line_num += 1;
            match self.lines.next() {
                None => {
                    if sentence.is_empty() {
                        return None;
                    }
                    // Last sentence without trailing blank line
                    break;
                }
                Some(Err(e)) => return Some(Err(Error::Io(e))),
                Some(Ok(line)) => {
                    let line = line.trim_end_matches(['\r', '\n']);
                    if line.trim().is_empty() {
                        if !sentence.is_empty() {
                            break;
                        }
                        continue;
                    }

                    match parse_line(line, self.line_num) {
                        Ok(tagged) => sentence.push(tagged),
                        Err(e) => return Some(Err(e)),
                    }
                }
            }
        }

        Some(Ok(sentence))
    }
}

/// Parse one token line: token first, POS and chunk last
fn parse_line(line: &str, line_num: usize) -> Result<TaggedToken> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() < 3 {
        return Err(Error::Column {
            line_num,
            message: format!("Expected at least 3 fields, found {}", fields.len()),
        });
    }

    let token = fields[0].trim();
    let pos = fields[fields.len() - 2].trim();
    let chunk = fields[fields.len() - 1].trim();

    if token.is_empty() || pos.is_empty() || chunk.is_empty() {
        return Err(Error::Column {
            line_num,
            message: "Empty token, POS or chunk field".to_string(),
        });
    }

    Ok(TaggedToken::new(token, pos, chunk))
}

/// Collect the pronoun positions of a document
///
/// A token is a pronoun when its POS tag starts with the lexicon's pronoun
/// prefix. Sentences without pronouns are left out.
pub fn build_pronoun_map(sentences: &[Vec<TaggedToken>], lexicon: &Lexicon) -> PronounIndexMap {
    sentences
        .iter()
        .enumerate()
        .filter_map(|(sent_id, sentence)| {
            let indices: Vec<usize> = sentence
                .iter()
                .enumerate()
                .filter(|(_, tagged)| lexicon.is_pronoun_tag(&tagged.pos))
                .map(|(i, _)| i)
                .collect();
            (!indices.is_empty()).then_some((sent_id, indices))
        })
        .collect()
}
