//! Core data models used throughout the pipeline.
//!
//! Records arrive as loosely shaped [`ArticleRecord`]s and are validated once
//! at the corpus boundary into immutable [`Article`]s. Everything downstream
//! works with the typed values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::corpus::Corpus;
use crate::error::RecordError;

/// Raw article record as supplied by a corpus source, before validation.
///
/// `body` also accepts `text` and `category` also accepts `section`, the
/// field names used by scraped article dumps. Those dumps keep the
/// publication date under `source_metadata.date`, which is used when
/// `published_at` (or `date`) is absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "text")]
    pub body: Option<String>,
    #[serde(default, alias = "section")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "date")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_metadata: Option<SourceMetadata>,
}

/// Provenance block of scraped records. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourceMetadata {
    #[serde(default)]
    pub date: Option<String>,
}

/// An [`ArticleRecord`] whose required fields are present.
#[derive(Debug, Clone)]
pub struct ValidRecord {
    pub id: String,
    pub title: String,
    pub body: String,
    pub category: String,
    pub tags: Vec<String>,
    pub url: Option<String>,
    pub published_at: Option<String>,
}

impl ArticleRecord {
    /// Check required fields. A missing or blank `id` falls back to `origin`.
    pub fn validate(self, origin: &str) -> Result<ValidRecord, RecordError> {
        let title = required(self.title, "title")?;
        let body = required(self.body, "body")?;
        let category = required(self.category, "category")?;
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => origin.to_string(),
        };
        Ok(ValidRecord {
            id,
            title,
            body,
            category: normalize_label(&category),
            tags: self
                .tags
                .iter()
                .map(|t| normalize_label(t))
                .filter(|t| !t.is_empty())
                .collect(),
            url: self.url.filter(|u| !u.trim().is_empty()),
            published_at: self
                .published_at
                .filter(|d| !d.trim().is_empty())
                .or_else(|| self.source_metadata.and_then(|m| m.date))
                .filter(|d| !d.trim().is_empty()),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, RecordError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RecordError::MissingField(field.to_string())),
    }
}

/// Canonical form for category labels: NFC, trimmed, lowercase.
pub fn normalize_label(label: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    label.trim().nfc().collect::<String>().to_lowercase()
}

/// A named entity found in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// One corpus document with its precomputed feature vector.
///
/// Immutable after the corpus is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Normalized primary category; owns one axis of the feature space.
    pub category: String,
    pub tags: Vec<String>,
    /// Categories the annotator found in the title and body. Each one also
    /// sets its axis in `vector`.
    #[serde(default)]
    pub detected_categories: BTreeSet<String>,
    pub url: Option<String>,
    pub published_at: Option<String>,
    pub entities: Vec<Entity>,
    pub vector: Vec<f32>,
}

impl Article {
    /// Category, tags and detected categories, used when explaining matches.
    pub fn labels(&self) -> BTreeSet<&str> {
        std::iter::once(self.category.as_str())
            .chain(self.tags.iter().map(String::as_str))
            .chain(self.detected_categories.iter().map(String::as_str))
            .collect()
    }
}

/// One user's interest representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Normalized selected categories, including ones unknown to the corpus.
    pub categories: BTreeSet<String>,
    /// Categories detected in `free_text`; merged with `categories` when
    /// vectorizing.
    #[serde(default)]
    pub detected_categories: BTreeSet<String>,
    /// Free-text interests exactly as given.
    pub free_text: String,
    /// Human-readable description of the profile inputs.
    pub profile_text: String,
    pub keywords: Vec<String>,
    /// Entities in extraction order; may repeat.
    pub entities: Vec<Entity>,
    pub vector: Vec<f32>,
    /// Version of the corpus whose vocabulary produced `vector`. Only
    /// meaningful within one process; use `feature_space` to compare.
    pub corpus_version: u64,
    /// Identity of the feature space `vector` lives in (see
    /// [`Corpus::feature_space`](crate::Corpus::feature_space)). Empty for
    /// profiles stored before it was recorded, which are always refreshed.
    #[serde(default)]
    pub feature_space: String,
}

impl Profile {
    /// Selected and detected categories, sorted and deduplicated.
    pub fn interests(&self) -> BTreeSet<&str> {
        self.categories
            .iter()
            .chain(self.detected_categories.iter())
            .map(String::as_str)
            .collect()
    }

    /// True when the vector was computed in `corpus`'s feature space.
    pub fn is_current_for(&self, corpus: &Corpus) -> bool {
        self.feature_space == corpus.feature_space() && self.vector.len() == corpus.dims()
    }

    /// True when the vector is all zeros (no usable input).
    pub fn is_neutral(&self) -> bool {
        self.vector.iter().all(|x| *x == 0.0)
    }
}

/// An article paired with its similarity score for one ranking call.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub article: Arc<Article>,
    pub score: f32,
}
