//! mlcoref: Pronoun resolution for Malayalam
//!
//! Builds constituent trees from shallow-parser output and resolves
//! pronouns with Hobbs' tree search, filtered by morphological agreement.
//! Core implementation in Rust with Python bindings.

pub mod bracket; // Bracket text to trees
pub mod builder; // Tagged tokens to bracket text
pub mod error;
pub mod hobbs; // Antecedent search over one document
pub mod lexicon; // Pronoun word lists
pub mod morph; // Feature bundles and agreement
pub mod resolver; // End-to-end resolution
pub mod tagged; // Shallow-parser output reading
pub mod tree; // Constituent tree data structures

// Python bindings
#[cfg(feature = "pyo3")]
pub mod python;

// Re-exports for convenience
pub use bracket::{parse_forest, parse_tree};
pub use builder::{TaggedToken, build_forest, build_tree, to_bracketed};
pub use error::{Error, Result};
pub use hobbs::{Proposal, hobbs};
pub use lexicon::{Lexicon, PronounClass};
pub use morph::{FeatureBundle, LookupAnalyser, MorphAnalyser, NoMorphology, compatible};
pub use resolver::{Report, Resolution, ResolutionResult, Resolver, ResolverOptions, ShallowParser};
pub use tagged::{PronounIndexMap, TaggedReader, build_pronoun_map};
pub use tree::{NodeId, ParseTree, Position, SentenceForest, Target};
