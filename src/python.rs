//! Python bindings for mlcoref
//!
//! Tagged tokens cross the boundary as `(token, pos, chunk)` tuples and the
//! morphological analyser, when given, is any Python callable that maps a
//! token to a list of analysis dicts such as
//! `{"pos": "n", "feat": {"gend": "f", "num": "sg", "case": "nom"}}`.

use log::warn;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::builder::{TaggedToken, to_bracketed};
use crate::lexicon::Lexicon;
use crate::morph::{FeatureBundle, MorphAnalyser};
use crate::resolver::{ResolutionResult, Resolver};
use crate::tagged::{self, PronounIndexMap};

type PyTaggedToken = (String, String, String);

/// Analyser that calls back into Python
struct PyAnalyser {
    callable: Option<Py<PyAny>>,
}

impl MorphAnalyser for PyAnalyser {
    fn analyse(&self, token: &str) -> Vec<FeatureBundle> {
        let Some(callable) = &self.callable else {
            return Vec::new();
        };

        Python::attach(|py| {
            let analyses = callable
                .bind(py)
                .call1((token,))
                .and_then(|result| result.extract::<Vec<Bound<'_, PyDict>>>());
            match analyses {
                Ok(analyses) => analyses.iter().map(analysis_features).collect(),
                Err(e) => {
                    warn!("analyser failed on '{}': {}", token, e);
                    Vec::new()
                }
            }
        })
    }
}

/// Flatten one analysis dict and its nested `feat` dict
fn analysis_features(analysis: &Bound<'_, PyDict>) -> FeatureBundle {
    let feat = analysis
        .get_item("feat")
        .ok()
        .flatten()
        .and_then(|feat| feat.extract::<Bound<'_, PyDict>>().ok());
    let nested = feat.as_ref().map(string_items).unwrap_or_default();
    FeatureBundle::from_analysis(string_items(analysis), nested)
}

/// String-valued entries of a dict; anything else is skipped
fn string_items(dict: &Bound<'_, PyDict>) -> Vec<(String, String)> {
    dict.iter()
        .filter_map(|(key, value)| Some((key.extract::<String>().ok()?, value.extract::<String>().ok()?)))
        .collect()
}

fn tagged_sentence(tokens: Vec<PyTaggedToken>) -> Vec<TaggedToken> {
    tokens.into_iter().map(TaggedToken::from).collect()
}

/// Render tagged sentences as bracket text, one string per sentence.
///
/// Args:
///     chunks_list: List of sentences, each a list of (token, pos, chunk)
#[pyfunction]
fn list_to_parsable_string(chunks_list: Vec<Vec<PyTaggedToken>>) -> Vec<String> {
    chunks_list
        .into_iter()
        .map(|tokens| to_bracketed(&tagged_sentence(tokens)))
        .collect()
}

/// Map sentence index to the token indices of its pronouns.
///
/// Args:
///     sentences: List of sentences, each a list of (token, pos, chunk)
#[pyfunction]
fn build_pronoun_map(sentences: Vec<Vec<PyTaggedToken>>) -> PronounIndexMap {
    let sentences: Vec<_> = sentences.into_iter().map(tagged_sentence).collect();
    tagged::build_pronoun_map(&sentences, &Lexicon::malayalam())
}

/// Pronoun class of a token: "locative", "reflexive", "personal",
/// "demonstrative" or "other".
#[pyfunction]
fn classify_pronoun(token: &str) -> &'static str {
    Lexicon::malayalam().classify(token).as_str()
}

/// Resolve pronouns over a document of bracketed sentence trees.
///
/// Args:
///     words_list: Surface tokens per sentence
///     parsable_strings: One bracketed tree per sentence
///     pronouns: Sentence index to pronoun token indices
///     analyser: Optional callable returning a list of analysis dicts
///     return_all_candidates: Keep every agreeing candidate, not just the first
///
/// Returns:
///     Dict of sentence index to dict of pronoun index to candidate list
///
/// Raises:
///     ValueError: If the word lists and trees do not line up
#[pyfunction]
#[pyo3(signature = (words_list, parsable_strings, pronouns, analyser=None, return_all_candidates=false))]
fn resolve_pronouns(
    words_list: Vec<Vec<String>>,
    parsable_strings: Vec<String>,
    pronouns: PronounIndexMap,
    analyser: Option<Py<PyAny>>,
    return_all_candidates: bool,
) -> PyResult<ResolutionResult> {
    if words_list.len() != parsable_strings.len() {
        return Err(PyValueError::new_err(format!(
            "{} word lists but {} trees",
            words_list.len(),
            parsable_strings.len()
        )));
    }

    let resolver = Resolver::new(PyAnalyser { callable: analyser })
        .return_all_candidates(return_all_candidates);
    let resolution = resolver.resolve_bracketed(&words_list, &parsable_strings, &pronouns);
    Ok(resolution.coref)
}

/// Resolve pronouns over a document of tagged sentences.
///
/// Pronouns are found from the POS tags; sentences whose trees cannot be
/// built are skipped.
#[pyfunction]
#[pyo3(signature = (sentences, analyser=None, return_all_candidates=false))]
fn resolve_tagged(
    sentences: Vec<Vec<PyTaggedToken>>,
    analyser: Option<Py<PyAny>>,
    return_all_candidates: bool,
) -> ResolutionResult {
    let sentences: Vec<_> = sentences.into_iter().map(tagged_sentence).collect();
    Resolver::new(PyAnalyser { callable: analyser })
        .return_all_candidates(return_all_candidates)
        .resolve_tagged(&sentences)
        .coref
}

#[pyfunction]
fn __version__() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pymodule]
fn mlcoref(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(list_to_parsable_string, m)?)?;
    m.add_function(wrap_pyfunction!(build_pronoun_map, m)?)?;
    m.add_function(wrap_pyfunction!(classify_pronoun, m)?)?;
    m.add_function(wrap_pyfunction!(resolve_pronouns, m)?)?;
    m.add_function(wrap_pyfunction!(resolve_tagged, m)?)?;
    m.add_function(wrap_pyfunction!(__version__, m)?)?;

    Ok(())
}
