//! Profile vectorization.
//!
//! Turns a user's selected categories and free-text interests into a
//! [`Profile`] whose vector lives in the same feature space as the corpus
//! articles. The result depends only on the inputs and the corpus
//! feature space, so calling it again with the same inputs against a corpus
//! with the same [`Corpus::feature_space`] yields a bit-identical vector.
//!
//! Categories the [`Analyzer`] detects in the free text are merged with the
//! selected ones for the vector. The unknown-category policy only looks at
//! the selected categories.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::corpus::Corpus;
use crate::error::VectorizationError;
use crate::models::{normalize_label, Profile};
use crate::nlp::{ngrams, Analyzer};

const MAX_KEYWORDS: usize = 10;

/// What to do with a selected category the corpus does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryPolicy {
    /// Keep it on the profile but give it no vector weight.
    #[default]
    Ignore,
    /// Fail with [`VectorizationError::UnknownCategory`].
    Reject,
}

pub struct ProfileVectorizer {
    analyzer: Analyzer,
    policy: CategoryPolicy,
}

impl ProfileVectorizer {
    pub fn new(analyzer: Analyzer, policy: CategoryPolicy) -> Self {
        Self { analyzer, policy }
    }

    pub fn policy(&self) -> CategoryPolicy {
        self.policy
    }

    /// Build a profile against `corpus`.
    ///
    /// Empty categories and empty text are valid and produce the zero vector.
    pub fn vectorize<I, S>(
        &self,
        categories: I,
        free_text: &str,
        corpus: &Corpus,
    ) -> Result<Profile, VectorizationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let categories: BTreeSet<String> = categories
            .into_iter()
            .map(|c| normalize_label(c.as_ref()))
            .filter(|c| !c.is_empty())
            .collect();

        let vocabulary = corpus.vocabulary();
        for category in &categories {
            if !vocabulary.contains_category(category) {
                match self.policy {
                    CategoryPolicy::Ignore => {
                        debug!(category = %category, "ignoring unknown category")
                    }
                    CategoryPolicy::Reject => {
                        return Err(VectorizationError::UnknownCategory {
                            category: category.clone(),
                        })
                    }
                }
            }
        }

        let detected_categories = self.analyzer.detect_categories(free_text);
        let merged: BTreeSet<&str> = categories
            .iter()
            .chain(&detected_categories)
            .map(String::as_str)
            .collect();

        let tokens = self.analyzer.tokenize(free_text);
        let terms = ngrams(&tokens, corpus.params().ngram_max);
        let vector = vocabulary.vector_for(corpus.params(), merged, &terms);

        Ok(Profile {
            profile_text: profile_text(&categories, free_text),
            keywords: keywords(&tokens),
            entities: self.analyzer.extract_entities(free_text),
            categories,
            detected_categories,
            free_text: free_text.to_string(),
            vector,
            corpus_version: corpus.version(),
            feature_space: corpus.feature_space().to_string(),
        })
    }

    /// Recompute `profile` against `corpus` from its stored raw inputs.
    ///
    /// Detected categories are derived again from the free text.
    pub fn refresh(&self, profile: &Profile, corpus: &Corpus) -> Result<Profile, VectorizationError> {
        self.vectorize(&profile.categories, &profile.free_text, corpus)
    }
}

/// Human-readable summary of the raw inputs.
pub fn profile_text(categories: &BTreeSet<String>, free_text: &str) -> String {
    let mut parts = Vec::new();
    if !categories.is_empty() {
        let joined: Vec<&str> = categories.iter().map(String::as_str).collect();
        parts.push(format!("Selected interests: {}", joined.join(", ")));
    }
    let detail = free_text.trim();
    if !detail.is_empty() {
        parts.push(format!("Additional detail: {}", detail));
    }
    if parts.is_empty() {
        "No interests provided".to_string()
    } else {
        parts.join(". ")
    }
}

/// First distinct tokens longer than two characters.
fn keywords(tokens: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tokens
        .iter()
        .filter(|t| t.chars().count() > 2)
        .filter(|t| seen.insert(t.as_str()))
        .take(MAX_KEYWORDS)
        .cloned()
        .collect()
}
