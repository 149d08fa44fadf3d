//! Morphological features and agreement checking
//!
//! Morphology comes from an external analyser. The core only needs the
//! first analysis of a token, reduced to a `FeatureBundle`; a token the
//! analyser cannot handle yields an empty bundle, which agrees with
//! everything.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::lexicon::Lexicon;

/// Person/number/gender/case/POS features of one token
///
/// `None` means unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureBundle {
    pub person: Option<String>,
    pub number: Option<String>,
    pub gender: Option<String>,
    pub case: Option<String>,
    pub pos: Option<String>,
}

impl FeatureBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_person(mut self, person: &str) -> Self {
        self.person = Some(person.to_string());
        self
    }

    pub fn with_number(mut self, number: &str) -> Self {
        self.number = Some(number.to_string());
        self
    }

    pub fn with_gender(mut self, gender: &str) -> Self {
        self.gender = Some(gender.to_string());
        self
    }

    pub fn with_case(mut self, case: &str) -> Self {
        self.case = Some(case.to_string());
        self
    }

    pub fn with_pos(mut self, pos: &str) -> Self {
        self.pos = Some(pos.to_string());
        self
    }

    /// True when the analyser produced nothing at all
    pub fn is_empty(&self) -> bool {
        self.person.is_none()
            && self.number.is_none()
            && self.gender.is_none()
            && self.case.is_none()
            && self.pos.is_none()
    }

    /// Build from analyser key/value pairs
    ///
    /// Accepts both the short analyser keys (`pers`, `num`, `gend`) and the
    /// long names. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut bundle = Self::default();
        for (key, value) in pairs {
            let value = Some(value.as_ref().to_string());
            match key.as_ref() {
                "pers" | "person" => bundle.person = value,
                "num" | "number" => bundle.number = value,
                "gend" | "gender" => bundle.gender = value,
                "case" => bundle.case = value,
                "pos" => bundle.pos = value,
                _ => {}
            }
        }
        bundle
    }

    /// Build from an analyser record with a nested feature map
    ///
    /// `top` holds the record's own entries (typically `pos`) and `feat`
    /// the entries of its `feat` map; the nested entries win on a clash.
    pub fn from_analysis<I, J, K, V>(top: I, feat: J) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        J: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::from_pairs(top.into_iter().chain(feat))
    }
}

/// External morphological analyser
pub trait MorphAnalyser {
    /// All analyses of `token`, best first
    fn analyse(&self, token: &str) -> Vec<FeatureBundle>;

    /// Features of the first analysis, or an empty bundle
    fn features(&self, token: &str) -> FeatureBundle {
        self.analyse(token).into_iter().next().unwrap_or_default()
    }
}

impl<F> MorphAnalyser for F
where
    F: Fn(&str) -> Vec<FeatureBundle>,
{
    fn analyse(&self, token: &str) -> Vec<FeatureBundle> {
        self(token)
    }
}

/// Analyser that never recognizes anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMorphology;

impl MorphAnalyser for NoMorphology {
    fn analyse(&self, _token: &str) -> Vec<FeatureBundle> {
        Vec::new()
    }
}

/// Analyser backed by a fixed token table
#[derive(Debug, Clone, Default)]
pub struct LookupAnalyser {
    entries: FxHashMap<String, Vec<FeatureBundle>>,
}

impl LookupAnalyser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an analysis for `token` after any existing ones
    pub fn insert(&mut self, token: &str, features: FeatureBundle) {
        self.entries
            .entry(token.to_string())
            .or_default()
            .push(features);
    }

    pub fn with(mut self, token: &str, features: FeatureBundle) -> Self {
        self.insert(token, features);
        self
    }
}

impl MorphAnalyser for LookupAnalyser {
    fn analyse(&self, token: &str) -> Vec<FeatureBundle> {
        self.entries.get(token).cloned().unwrap_or_default()
    }
}

/// Heuristic agreement between a pronoun and a candidate antecedent
///
/// Person, number and gender must not conflict where both sides specify
/// them, and a case-marked candidate must be nominative.
pub fn compatible(pronoun: &FeatureBundle, candidate: &FeatureBundle, lexicon: &Lexicon) -> bool {
    if pronoun.is_empty() || candidate.is_empty() {
        return true;
    }

    if conflicts(&pronoun.person, &candidate.person)
        || conflicts(&pronoun.number, &candidate.number)
        || conflicts(&pronoun.gender, &candidate.gender)
    {
        return false;
    }

    match &candidate.case {
        Some(case) => lexicon.is_nominative(case),
        None => true,
    }
}

fn conflicts(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a != b)
}
