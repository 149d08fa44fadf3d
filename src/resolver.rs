//! Pronoun resolution over a document
//!
//! The resolver ties the pieces together: for every pronoun listed in the
//! pronoun index map it classifies the pronoun, runs the Hobbs search for
//! each applicable target class, and keeps the proposals that agree
//! morphologically with the pronoun.

use std::collections::BTreeMap;

use log::{debug, warn};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::bracket::parse_forest;
use crate::builder::{TaggedToken, build_forest, build_tree};
use crate::error::Error;
use crate::hobbs::{hobbs, locate_pronoun};
use crate::lexicon::{Lexicon, PronounClass};
use crate::morph::{MorphAnalyser, NoMorphology, compatible};
use crate::tagged::{PronounIndexMap, build_pronoun_map};
use crate::tree::{SentenceForest, Target};

/// Sentence index to pronoun token index to candidate antecedents, best
/// first
pub type ResolutionResult = BTreeMap<usize, BTreeMap<usize, Vec<String>>>;

/// Target passes for non-locative pronouns, in order
const NOMINAL_PASSES: [Target; 2] = [Target::NounPhrase, Target::Noun];

/// External tagging and chunking pipeline
pub trait ShallowParser {
    /// Tag one already-split sentence
    fn tag_and_chunk(&self, sentence: &str) -> Result<Vec<TaggedToken>, String>;
}

impl<F> ShallowParser for F
where
    F: Fn(&str) -> Result<Vec<TaggedToken>, String>,
{
    fn tag_and_chunk(&self, sentence: &str) -> Result<Vec<TaggedToken>, String> {
        self(sentence)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Keep the noun pass result as well as the noun-phrase one
    pub return_all_candidates: bool,
}

/// Resolution of a pre-tagged or pre-bracketed document
#[derive(Debug, Default, Serialize)]
pub struct Resolution {
    pub coref: ResolutionResult,
    /// Sentences that could not be processed
    #[serde(skip)]
    pub skipped: Vec<Error>,
}

/// Resolution of raw sentences through a shallow parser
#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub sentences: Vec<String>,
    pub tokens: Vec<Vec<String>>,
    pub coref: ResolutionResult,
    #[serde(skip)]
    pub skipped: Vec<Error>,
}

/// Pronoun resolver
#[derive(Debug, Clone)]
pub struct Resolver<A = NoMorphology> {
    analyser: A,
    lexicon: Lexicon,
    options: ResolverOptions,
}

impl Default for Resolver<NoMorphology> {
    fn default() -> Self {
        Self::new(NoMorphology)
    }
}

impl<A: MorphAnalyser> Resolver<A> {
    /// Create a resolver with the Malayalam lexicon and default options
    pub fn new(analyser: A) -> Self {
        Self {
            analyser,
            lexicon: Lexicon::malayalam(),
            options: ResolverOptions::default(),
        }
    }

    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn return_all_candidates(mut self, all: bool) -> Self {
        self.options.return_all_candidates = all;
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Resolve every pronoun in `pronouns` against an already built forest
    ///
    /// `words` gives the surface tokens per sentence; when a sentence or
    /// token is missing there, the tree's own leaf is used instead.
    pub fn resolve<T: AsRef<str>>(
        &self,
        forest: &SentenceForest,
        words: &[Vec<T>],
        pronouns: &PronounIndexMap,
    ) -> ResolutionResult {
        let mut results = ResolutionResult::new();

        for (&sentence, indices) in pronouns {
            let Some(tree) = forest.get(sentence) else {
                debug!("sentence {} has no tree; skipping its pronouns", sentence);
                continue;
            };

            let mut out_for_sent = BTreeMap::new();
            for &index in indices {
                let token = words
                    .get(sentence)
                    .and_then(|w| w.get(index))
                    .map(|t| t.as_ref())
                    .or_else(|| tree.leaf(index).and_then(|id| tree.node(id).token.as_deref()));
                let Some(token) = token else {
                    warn!("sentence {}: no token at pronoun index {}", sentence, index);
                    continue;
                };

                let candidates = self.resolve_pronoun(forest, sentence, index, token);
                if !candidates.is_empty() {
                    out_for_sent.insert(index, candidates);
                }
            }

            if !out_for_sent.is_empty() {
                results.insert(sentence, out_for_sent);
            }
        }

        results
    }

    /// Candidate antecedents for one pronoun, best first, without duplicates
    pub fn resolve_pronoun(
        &self,
        forest: &SentenceForest,
        sentence: usize,
        index: usize,
        token: &str,
    ) -> Vec<String> {
        let Some(leaf) = forest
            .get(sentence)
            .and_then(|tree| locate_pronoun(tree, index, token))
        else {
            warn!(
                "sentence {}: pronoun '{}' not found at token {}",
                sentence, token, index
            );
            return Vec::new();
        };

        let passes: &[Target] = match self.lexicon.classify(token) {
            PronounClass::Locative => &[Target::Locative],
            _ => &NOMINAL_PASSES,
        };
        let pronoun_features = self.analyser.features(token);

        let mut candidates: Vec<String> = Vec::new();
        for &target in passes {
            let Some(surface) = hobbs(forest, sentence, leaf, target)
                .and_then(|proposal| proposal.surface(forest))
            else {
                continue;
            };

            let candidate_features = self.analyser.features(surface);
            if !compatible(&pronoun_features, &candidate_features, &self.lexicon) {
                debug!(
                    "sentence {}: '{}' rejected for '{}' by agreement",
                    sentence, surface, token
                );
                continue;
            }

            debug!(
                "sentence {}: '{}' -> '{}' ({} pass)",
                sentence, token, surface, target
            );
            candidates.push(surface.to_string());
            if !self.options.return_all_candidates {
                break;
            }
        }

        let mut seen = FxHashSet::default();
        candidates.retain(|c| seen.insert(c.clone()));
        candidates
    }

    /// Resolve a document given as bracketed trees
    pub fn resolve_bracketed<T: AsRef<str>, S: AsRef<str>>(
        &self,
        words: &[Vec<T>],
        bracketed: &[S],
        pronouns: &PronounIndexMap,
    ) -> Resolution {
        let (forest, skipped) = parse_forest(bracketed);
        Resolution {
            coref: self.resolve(&forest, words, pronouns),
            skipped,
        }
    }

    /// Resolve a document given as shallow-parser output
    ///
    /// Pronouns are found from the POS tags.
    pub fn resolve_tagged(&self, sentences: &[Vec<TaggedToken>]) -> Resolution {
        let (forest, skipped) = build_forest(sentences);
        let pronouns = build_pronoun_map(sentences, &self.lexicon);
        let words = surface_tokens(sentences);
        Resolution {
            coref: self.resolve(&forest, &words, &pronouns),
            skipped,
        }
    }

    /// Tag already-split sentences and resolve their pronouns
    ///
    /// A sentence the parser fails on, or whose tree cannot be built, is
    /// skipped and reported; the rest of the document is still resolved.
    pub fn find_coref<S, P>(&self, sentences: &[S], parser: &P) -> Report
    where
        S: AsRef<str>,
        P: ShallowParser + ?Sized,
    {
        let mut forest = SentenceForest::new();
        let mut tagged = Vec::with_capacity(sentences.len());
        let mut skipped = Vec::new();

        for (index, sentence) in sentences.iter().enumerate() {
            let tokens = match parser.tag_and_chunk(sentence.as_ref()) {
                Ok(tokens) => tokens,
                Err(message) => {
                    let e = Error::Tagger { index, message };
                    warn!("skipping sentence: {}", e);
                    skipped.push(e);
                    forest.push_gap();
                    tagged.push(Vec::new());
                    continue;
                }
            };

            match build_tree(&tokens) {
                Ok(tree) => {
                    forest.push(tree);
                }
                Err(e) => {
                    let e = e.in_sentence(index);
                    warn!("skipping sentence: {}", e);
                    skipped.push(e);
                    forest.push_gap();
                }
            }
            tagged.push(tokens);
        }

        let pronouns = build_pronoun_map(&tagged, &self.lexicon);
        let tokens = surface_tokens(&tagged);
        let coref = self.resolve(&forest, &tokens, &pronouns);

        Report {
            sentences: sentences.iter().map(|s| s.as_ref().to_string()).collect(),
            tokens,
            coref,
            skipped,
        }
    }
}

fn surface_tokens(sentences: &[Vec<TaggedToken>]) -> Vec<Vec<String>> {
    sentences
        .iter()
        .map(|sentence| sentence.iter().map(|t| t.token.clone()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::{FeatureBundle, LookupAnalyser};

    fn plain() -> Resolver {
        Resolver::new(NoMorphology)
    }

    fn tagged(tokens: &[(&str, &str, &str)]) -> Vec<TaggedToken> {
        tokens.iter().map(|&t| t.into()).collect()
    }

    /// "The cat sat on the table. It slept."
    fn cat_document() -> Vec<Vec<TaggedToken>> {
        vec![
            tagged(&[
                ("പൂച്ച", "N__NN", "B-NP"),
                ("മേശയ്ക്ക്", "N__NN", "B-NP"),
                ("മുകളിൽ", "N__NST", "I-NP"),
                ("ഇരിക്കുന്നു", "V__VM", "B-VGF"),
            ]),
            tagged(&[("അത്", "PR__PRP", "B-NP"), ("ഉറങ്ങുന്നു", "V__VM", "B-VGF")]),
        ]
    }

    /// A noun, then a proper noun, then "he came."
    fn girl_radha_document() -> Vec<Vec<TaggedToken>> {
        vec![
            tagged(&[
                ("പെൺകുട്ടി", "N__NN", "B-NP"),
                ("രാധ", "N__NNP", "B-NP"),
                ("വന്നു", "V__VM", "B-VGF"),
            ]),
            tagged(&[("അവൻ", "PR__PRP", "B-NP"), ("വന്നു", "V__VM", "B-VGF")]),
        ]
    }

    fn cat_analyser() -> LookupAnalyser {
        LookupAnalyser::new()
            .with("പൂച്ച", FeatureBundle::new().with_number("sg").with_case("nom"))
            .with("മേശയ്ക്ക്", FeatureBundle::new().with_number("sg").with_case("dat"))
            .with("അത്", FeatureBundle::new().with_person("3").with_number("sg"))
    }

    #[test]
    fn test_previous_sentence_antecedent() {
        let resolver = Resolver::new(cat_analyser());
        let resolution = resolver.resolve_tagged(&cat_document());

        assert!(resolution.skipped.is_empty());
        assert_eq!(resolution.coref.len(), 1);
        assert_eq!(resolution.coref[&1][&0], vec!["പൂച്ച".to_string()]);
    }

    #[test]
    fn test_first_sentence_subject_is_omitted() {
        let document = vec![tagged(&[
            ("അവൻ", "PR__PRP", "B-NP"),
            ("വീട്", "N__NN", "B-NP"),
            ("കണ്ടു", "V__VM", "B-VGF"),
        ])];
        let resolution = plain()
            .return_all_candidates(true)
            .resolve_tagged(&document);

        assert!(resolution.coref.is_empty());
    }

    #[test]
    fn test_locative_without_locative_labels_is_omitted() {
        let mut document = cat_document();
        document[1] = tagged(&[("അവിടെ", "PR__PRP", "B-NP"), ("ഉറങ്ങി", "V__VM", "B-VGF")]);

        let resolver = plain().return_all_candidates(true);
        let resolution = resolver.resolve_tagged(&document);
        assert!(resolution.coref.is_empty());

        // A nominal pronoun in the same spot does find the cat
        document[1][0].token = "അത്".to_string();
        let resolution = resolver.resolve_tagged(&document);
        assert_eq!(resolution.coref[&1][&0], vec!["പൂച്ച".to_string()]);
    }

    #[test]
    fn test_locative_resolves_to_locative_node() {
        let words = vec![
            vec!["സ്കൂളിൽ", "പോയി"],
            vec!["അവിടെ", "ഉറങ്ങി"],
        ];
        let bracketed = [
            "( S ( CHUNK ( N_LOCATIVE ( NN സ്കൂളിൽ ) ) ) ( CHUNK ( V ( VM പോയി ) ) ) )",
            "( S ( CHUNK ( PR ( PRP അവിടെ ) ) ) ( CHUNK ( V ( VM ഉറങ്ങി ) ) ) )",
        ];
        let pronouns = PronounIndexMap::from([(1, vec![0])]);

        let resolution = plain().resolve_bracketed(&words, &bracketed, &pronouns);
        assert_eq!(resolution.coref[&1][&0], vec!["സ്കൂളിൽ".to_string()]);
    }

    #[test]
    fn test_bracketed_with_repeated_tokens() {
        // Bracket text as the tagger pipeline writes it, every token
        // repeated after its POS layer
        let bracketed = [
            "( S  ( CHUNK  ( N ( NN പൂച്ച )  പൂച്ച )  ) ( CHUNK  ( V ( VM ഇരിക്കുന്നു )  ഇരിക്കുന്നു )  )  ) ",
            "( S  ( CHUNK  ( PR ( PRP അത് )  അത് )  ) ( CHUNK  ( V ( VM ഉറങ്ങുന്നു )  ഉറങ്ങുന്നു )  )  ) ",
        ];
        let words = vec![vec!["പൂച്ച", "ഇരിക്കുന്നു"], vec!["അത്", "ഉറങ്ങുന്നു"]];
        let pronouns = PronounIndexMap::from([(1, vec![0])]);

        let resolution = plain().resolve_bracketed(&words, &bracketed, &pronouns);
        assert!(resolution.skipped.is_empty());
        assert_eq!(resolution.coref.len(), 1);
        assert_eq!(resolution.coref[&1][&0], vec!["പൂച്ച".to_string()]);
    }

    #[test]
    fn test_gender_mismatch_rejects_all() {
        let analyser = LookupAnalyser::new()
            .with("അവൻ", FeatureBundle::new().with_person("3").with_gender("m"))
            .with("രാധ", FeatureBundle::new().with_gender("f"))
            .with("പെൺകുട്ടി", FeatureBundle::new().with_gender("f"));

        for all in [false, true] {
            let resolver = Resolver::new(analyser.clone()).return_all_candidates(all);
            let resolution = resolver.resolve_tagged(&girl_radha_document());
            assert!(resolution.coref.is_empty());
        }
    }

    #[test]
    fn test_incompatible_noun_phrase_falls_through_to_noun() {
        let analyser = LookupAnalyser::new()
            .with("അവൻ", FeatureBundle::new().with_gender("f"))
            .with("രാധ", FeatureBundle::new().with_gender("m"))
            .with("പെൺകുട്ടി", FeatureBundle::new().with_gender("f"));

        let resolution = Resolver::new(analyser).resolve_tagged(&girl_radha_document());
        assert_eq!(resolution.coref[&1][&0], vec!["പെൺകുട്ടി".to_string()]);
    }

    #[test]
    fn test_same_surface_is_deduplicated() {
        let document = vec![
            tagged(&[("രാമൻ", "N__NNP", "B-NP"), ("വന്നു", "V__VM", "B-VGF")]),
            tagged(&[("അവൻ", "PR__PRP", "B-NP"), ("ഉറങ്ങി", "V__VM", "B-VGF")]),
        ];
        let resolution = plain()
            .return_all_candidates(true)
            .resolve_tagged(&document);

        assert_eq!(resolution.coref[&1][&0], vec!["രാമൻ".to_string()]);
    }

    #[test]
    fn test_first_candidate_is_prefix_of_all() {
        let document = girl_radha_document();
        let first = plain().resolve_tagged(&document).coref;
        let all = plain()
            .return_all_candidates(true)
            .resolve_tagged(&document)
            .coref;

        assert_eq!(all[&1][&0], vec!["രാധ".to_string(), "പെൺകുട്ടി".to_string()]);
        assert_eq!(first[&1][&0], vec!["രാധ".to_string()]);

        for (sentence, pronouns) in &first {
            for (index, candidates) in pronouns {
                let longer = &all[sentence][index];
                assert!(candidates.len() <= longer.len());
                assert_eq!(&longer[..candidates.len()], candidates.as_slice());
            }
        }
    }

    #[test]
    fn test_broken_sentence_is_skipped() {
        let mut document = cat_document();
        document.insert(
            1,
            tagged(&[
                ("a", "NN", "B-NP"),
                ("b", "NN", "I-NP"),
                ("അത്", "PR__PRP", "I-NP"),
            ]),
        );

        let resolution = plain().resolve_tagged(&document);

        assert_eq!(resolution.skipped.len(), 1);
        assert_eq!(resolution.skipped[0].sentence_index(), Some(1));
        assert!(!resolution.coref.contains_key(&1));
        // The last sentence searches past the gap
        assert_eq!(resolution.coref[&2][&0], vec!["പൂച്ച".to_string()]);
    }

    #[test]
    fn test_missing_pronoun_leaf_is_omitted() {
        let (forest, _) = build_forest(&cat_document());
        let words = vec![vec!["പൂച്ച"], vec!["ഇത്", "ഉറങ്ങുന്നു"]];
        let pronouns = PronounIndexMap::from([(1, vec![0, 5]), (7, vec![0])]);

        let coref = plain().resolve(&forest, &words, &pronouns);
        assert!(coref.is_empty());
    }

    #[test]
    fn test_words_fall_back_to_tree_leaves() {
        let (forest, _) = build_forest(&cat_document());
        let words: Vec<Vec<String>> = Vec::new();
        let pronouns = PronounIndexMap::from([(1, vec![0])]);

        let coref = plain().resolve(&forest, &words, &pronouns);
        assert_eq!(coref[&1][&0], vec!["പൂച്ച".to_string()]);
    }

    #[test]
    fn test_find_coref_with_parser() {
        let parser = |sentence: &str| -> Result<Vec<TaggedToken>, String> {
            sentence
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| {
                    let pos = match word {
                        "പൂച്ച" => "N__NN",
                        "അത്" => "PR__PRP",
                        "ഉറങ്ങുന്നു" | "ഇരിക്കുന്നു" => "V__VM",
                        other => return Err(format!("unknown word {}", other)),
                    };
                    let chunk = if i == 0 || pos == "V__VM" { "B-NP" } else { "I-NP" };
                    Ok(TaggedToken::new(word, pos, chunk))
                })
                .collect()
        };

        let sentences = ["പൂച്ച ഇരിക്കുന്നു", "മേശ ഉണ്ട്", "അത് ഉറങ്ങുന്നു"];
        let report = plain().find_coref(&sentences, &parser);

        assert_eq!(report.sentences.len(), 3);
        assert_eq!(report.tokens[0], vec!["പൂച്ച", "ഇരിക്കുന്നു"]);
        assert!(report.tokens[1].is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0], Error::Tagger { index: 1, .. }));
        assert_eq!(report.coref[&2][&0], vec!["പൂച്ച".to_string()]);
    }

    #[test]
    fn test_result_serializes_in_order() {
        let resolution = plain().resolve_tagged(&cat_document());
        let json = serde_json::to_string(&resolution).unwrap();
        assert_eq!(json, r#"{"coref":{"1":{"0":["പൂച്ച"]}}}"#);
    }

    #[test]
    fn test_custom_lexicon() {
        let lexicon = Lexicon::from_json(r#"{"locative": ["അത്"]}"#).unwrap();
        let resolver = plain().with_lexicon(lexicon);

        // "അത്" is now locative and there is no locative antecedent
        assert!(resolver.resolve_tagged(&cat_document()).coref.is_empty());
    }
}
