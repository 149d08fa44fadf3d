//! Bracketed tree parser
//!
//! Materializes `( LABEL child* )` text into a `ParseTree` using the pest
//! grammar in `bracket.pest`. A constituent holding exactly one bare word
//! becomes a leaf. Bare words next to sub-constituents are dropped: the
//! tagger pipeline repeats every token after its POS layer, as in
//! `( N ( NN word ) word )`, and only the labeled leaf counts as the token.

use log::warn;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::error::{Error, Result};
use crate::tree::{NodeId, ParseTree, SENTENCE_LABEL, SentenceForest, unescape_token};

#[derive(Parser)]
#[grammar = "bracket.pest"]
struct BracketParser;

/// Children of one bracketed constituent
enum Children<'i> {
    Word(&'i str),
    Trees(Vec<Pair<'i, Rule>>),
}

/// Parse one bracketed sentence into a tree rooted at "S"
pub fn parse_tree(input: &str) -> Result<ParseTree> {
    let mut pairs = BracketParser::parse(Rule::document, input)?;

    // document -> tree EOI
    let Some(tree_pair) = pairs.next().and_then(|doc| doc.into_inner().next()) else {
        return Err(Error::EmptyConstituent {
            label: String::new(),
        });
    };

    let (label, children) = split_constituent(tree_pair)?;
    if label != SENTENCE_LABEL {
        return Err(Error::BadRoot {
            label: label.to_string(),
        });
    }

    let mut tree = ParseTree::new(label);
    let root = tree.root();
    match children {
        Children::Trees(subtrees) => {
            for subtree in subtrees {
                add_constituent(&mut tree, root, subtree)?;
            }
        }
        Children::Word(_) => {
            return Err(Error::MixedConstituent {
                label: label.to_string(),
            });
        }
    }

    Ok(tree)
}

/// Parse a document's bracketed sentences into a forest
///
/// Sentences that fail to parse become gaps; their errors are returned
/// with the sentence index attached.
pub fn parse_forest<S: AsRef<str>>(inputs: &[S]) -> (SentenceForest, Vec<Error>) {
    let mut forest = SentenceForest::new();
    let mut skipped = Vec::new();

    for (index, input) in inputs.iter().enumerate() {
        match parse_tree(input.as_ref()) {
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

/// Attach the constituent in `pair` below `parent`
fn add_constituent(tree: &mut ParseTree, parent: NodeId, pair: Pair<'_, Rule>) -> Result<()> {
    let (label, children) = split_constituent(pair)?;

    match children {
        Children::Word(word) => {
            tree.add_leaf(parent, label, &unescape_token(word));
        }
        Children::Trees(subtrees) => {
            let id = tree.add_child(parent, label);
            for subtree in subtrees {
                add_constituent(tree, id, subtree)?;
            }
        }
    }

    Ok(())
}

fn split_constituent(pair: Pair<'_, Rule>) -> Result<(&str, Children<'_>)> {
    let mut inner = pair.into_inner();

    let Some(label_pair) = inner.next() else {
        return Err(Error::EmptyConstituent {
            label: String::new(),
        });
    };
    let label = label_pair.as_str();

    let mut words = Vec::new();
    let mut subtrees = Vec::new();
    for child in inner {
        match child.as_rule() {
            Rule::word => words.push(child.as_str()),
            Rule::tree => subtrees.push(child),
            _ => {}
        }
    }

    match (words.len(), subtrees.is_empty()) {
        (0, true) => Err(Error::EmptyConstituent {
            label: label.to_string(),
        }),
        (_, false) => Ok((label, Children::Trees(subtrees))),
        (1, true) => Ok((label, Children::Word(words[0]))),
        _ => Err(Error::MixedConstituent {
            label: label.to_string(),
        }),
    }
}
