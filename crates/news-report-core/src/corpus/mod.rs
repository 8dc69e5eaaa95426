//! Versioned, immutable article index.
//!
//! A [`Corpus`] is built in one pass by [`CorpusBuilder`] from validated
//! records: the vocabulary (category axes followed by TF-IDF term axes) is
//! fitted over all articles, then every article receives its feature vector.
//! Nothing in a built corpus is mutated afterwards; a rebuild produces a new
//! value that is swapped in through [`CorpusHandle`].
//!
//! # Feature space
//!
//! ```text
//! [ cat_0 … cat_k | term_0 … term_m ]
//!   one axis per     TF-IDF over unigrams (and bigrams),
//!   category         smoothed idf = ln((1+n)/(1+df)) + 1
//! ```
//!
//! Each block is L2-normalized and scaled by its weight, then the whole
//! vector is L2-normalized.
//!
//! An article sets the axis of its primary category and of every category
//! the [`Analyzer`] detects in its title and body. The axes and term
//! statistics together with the [`VectorizerParams`] are hashed into
//! [`Corpus::feature_space`], which identifies the space independently of
//! the process-local version number.

pub mod handle;

pub use handle::CorpusHandle;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{CorpusLoadError, RecordError};
use crate::models::{Article, ArticleRecord, ValidRecord};
use crate::nlp::{ngrams, Analyzer};
use crate::summarize::clean_text;

/// Tuning for vocabulary fitting and vector composition.
///
/// Changing any field changes the feature space, so cached corpora built
/// with different parameters must be discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerParams {
    /// Maximum number of term axes, chosen by corpus frequency.
    pub max_features: usize,
    /// Drop terms appearing in fewer documents than this.
    pub min_df: usize,
    /// Drop terms appearing in more than this fraction of documents.
    pub max_df: f32,
    /// Longest n-gram used as a term (1 = unigrams only).
    pub ngram_max: usize,
    /// Use `1 + ln(tf)` instead of raw term counts.
    pub sublinear_tf: bool,
    pub category_weight: f32,
    pub text_weight: f32,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            max_features: 3000,
            min_df: 2,
            max_df: 0.85,
            ngram_max: 2,
            sublinear_tf: true,
            category_weight: 1.0,
            text_weight: 1.0,
        }
    }
}

impl VectorizerParams {
    pub fn validate(&self) -> Result<(), CorpusLoadError> {
        let invalid = |msg: &str| -> Result<(), CorpusLoadError> {
            Err(CorpusLoadError::InvalidParams(msg.to_string()))
        };
        if self.min_df == 0 {
            return invalid("min_df must be >= 1");
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return invalid("max_df must be in (0.0, 1.0]");
        }
        if !(1..=3).contains(&self.ngram_max) {
            return invalid("ngram_max must be between 1 and 3");
        }
        for (name, w) in [
            ("category_weight", self.category_weight),
            ("text_weight", self.text_weight),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(CorpusLoadError::InvalidParams(format!(
                    "{} must be a finite, non-negative number",
                    name
                )));
            }
        }
        if self.category_weight == 0.0 && self.text_weight == 0.0 {
            return invalid("category_weight and text_weight cannot both be 0");
        }
        Ok(())
    }
}

/// Category axes and TF-IDF term statistics shared by articles and profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    categories: BTreeMap<String, usize>,
    terms: BTreeMap<String, usize>,
    idf: Vec<f32>,
}

impl Vocabulary {
    /// Fit term statistics over per-document term lists.
    pub fn fit(
        documents: &[Vec<String>],
        categories: BTreeSet<String>,
        params: &VectorizerParams,
    ) -> Self {
        let n_docs = documents.len();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut total_freq: HashMap<&str, usize> = HashMap::new();

        for doc in documents {
            let mut seen: HashSet<&str> = HashSet::new();
            for term in doc {
                *total_freq.entry(term.as_str()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        let max_docs = params.max_df * n_docs as f32;
        let mut candidates: Vec<(&str, usize)> = total_freq
            .into_iter()
            .filter(|(term, _)| {
                let df = doc_freq[term];
                df >= params.min_df && df as f32 <= max_docs
            })
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        candidates.truncate(params.max_features);

        let selected: BTreeSet<&str> = candidates.into_iter().map(|(t, _)| t).collect();
        let mut terms = BTreeMap::new();
        let mut idf = Vec::with_capacity(selected.len());
        for (index, term) in selected.into_iter().enumerate() {
            let df = doc_freq[term] as f32;
            idf.push(((1.0 + n_docs as f32) / (1.0 + df)).ln() + 1.0);
            terms.insert(term.to_string(), index);
        }

        let categories = categories
            .into_iter()
            .enumerate()
            .map(|(i, c)| (c, i))
            .collect();

        Self {
            categories,
            terms,
            idf,
        }
    }

    /// Total vector dimensionality.
    pub fn dims(&self) -> usize {
        self.categories.len() + self.terms.len()
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// Known categories in axis order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Every term has one idf weight and axis indices are a permutation of
    /// `0..len` in each block.
    fn check(&self) -> Result<(), String> {
        if self.idf.len() != self.terms.len() {
            return Err(format!(
                "{} terms but {} idf weights",
                self.terms.len(),
                self.idf.len()
            ));
        }
        if let Some(w) = self.idf.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(format!("invalid idf weight {}", w));
        }
        check_axes("category", &self.categories)?;
        check_axes("term", &self.terms)
    }

    /// Compose a normalized feature vector.
    ///
    /// Categories set their axis to 1 (unknown ones are ignored); terms
    /// missing from the vocabulary are ignored. Returns the zero vector when
    /// nothing matches.
    pub fn vector_for<'a, I>(&self, params: &VectorizerParams, categories: I, terms: &[String]) -> Vec<f32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let n_cat = self.categories.len();
        let mut vector = vec![0.0f32; self.dims()];

        for category in categories {
            if let Some(&axis) = self.categories.get(category) {
                vector[axis] = 1.0;
            }
        }

        let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
        for term in terms {
            if let Some(&index) = self.terms.get(term.as_str()) {
                *counts.entry(index).or_insert(0) += 1;
            }
        }
        for (index, count) in counts {
            let tf = if params.sublinear_tf {
                1.0 + (count as f32).ln()
            } else {
                count as f32
            };
            vector[n_cat + index] = tf * self.idf[index];
        }

        let (category_block, term_block) = vector.split_at_mut(n_cat);
        scale_block(category_block, params.category_weight);
        scale_block(term_block, params.text_weight);
        l2_normalize(&mut vector);
        vector
    }
}

fn check_axes(kind: &str, axes: &BTreeMap<String, usize>) -> Result<(), String> {
    let mut taken = vec![false; axes.len()];
    for (name, &index) in axes {
        match taken.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(format!("{} `{}` has invalid axis {}", kind, name, index)),
        }
    }
    Ok(())
}

/// SHA-256 over the params and every axis with its idf weight.
fn feature_space_id(params: &VectorizerParams, vocabulary: &Vocabulary) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"news-report/feature-space/v1");
    hasher.update((params.max_features as u64).to_le_bytes());
    hasher.update((params.min_df as u64).to_le_bytes());
    hasher.update(params.max_df.to_bits().to_le_bytes());
    hasher.update((params.ngram_max as u64).to_le_bytes());
    hasher.update([params.sublinear_tf as u8]);
    hasher.update(params.category_weight.to_bits().to_le_bytes());
    hasher.update(params.text_weight.to_bits().to_le_bytes());

    for (category, index) in &vocabulary.categories {
        hasher.update(b"c");
        hasher.update(category.as_bytes());
        hasher.update([0u8]);
        hasher.update((*index as u64).to_le_bytes());
    }
    for (term, index) in &vocabulary.terms {
        hasher.update(b"t");
        hasher.update(term.as_bytes());
        hasher.update([0u8]);
        hasher.update((*index as u64).to_le_bytes());
        let idf = vocabulary.idf.get(*index).copied().unwrap_or(f32::NAN);
        hasher.update(idf.to_bits().to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

fn l2_norm(values: &[f32]) -> f32 {
    values.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn scale_block(block: &mut [f32], weight: f32) {
    let norm = l2_norm(block);
    if norm > f32::EPSILON {
        for x in block.iter_mut() {
            *x = *x / norm * weight;
        }
    } else {
        block.fill(0.0);
    }
}

/// Scale to unit length in place; near-zero vectors become exactly zero.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm > f32::EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    } else {
        vector.fill(0.0);
    }
}

/// One built state of the article index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    version: u64,
    feature_space: String,
    params: VectorizerParams,
    vocabulary: Vocabulary,
    articles: BTreeMap<String, Arc<Article>>,
}

impl Corpus {
    /// A corpus with no articles and no vocabulary.
    pub fn empty(params: VectorizerParams) -> Self {
        let vocabulary = Vocabulary::default();
        Self {
            version: 0,
            feature_space: feature_space_id(&params, &vocabulary),
            params,
            vocabulary,
            articles: BTreeMap::new(),
        }
    }

    /// Version assigned when the corpus was installed in a [`CorpusHandle`]
    /// (0 = never installed).
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Hex digest identifying the feature space (params, axes, idf).
    ///
    /// Two corpora with the same id produce identical vectors for the same
    /// profile inputs, whichever process built them.
    pub fn feature_space(&self) -> &str {
        &self.feature_space
    }

    pub fn params(&self) -> &VectorizerParams {
        &self.params
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn dims(&self) -> usize {
        self.vocabulary.dims()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn article(&self, id: &str) -> Option<&Arc<Article>> {
        self.articles.get(id)
    }

    /// Articles in ascending id order.
    pub fn articles(&self) -> impl Iterator<Item = &Arc<Article>> {
        self.articles.values()
    }

    /// Number of articles per primary category.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for article in self.articles.values() {
            *counts.entry(article.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Verify a corpus that did not come out of [`CorpusBuilder`], such as
    /// one read back from a cache file.
    ///
    /// Checks the params, the vocabulary, every article vector against
    /// `dims()`, and that `feature_space` matches the vocabulary.
    pub fn check_consistency(&self) -> Result<(), CorpusLoadError> {
        self.params.validate()?;
        self.vocabulary
            .check()
            .map_err(CorpusLoadError::Inconsistent)?;

        let dims = self.dims();
        for (id, article) in &self.articles {
            if *id != article.id {
                return Err(CorpusLoadError::Inconsistent(format!(
                    "article `{}` stored under id `{}`",
                    article.id, id
                )));
            }
            if article.vector.len() != dims {
                return Err(CorpusLoadError::Inconsistent(format!(
                    "article `{}` has {} dimensions, expected {}",
                    id,
                    article.vector.len(),
                    dims
                )));
            }
            if article.vector.iter().any(|x| !x.is_finite()) {
                return Err(CorpusLoadError::Inconsistent(format!(
                    "article `{}` has a non-finite vector component",
                    id
                )));
            }
        }

        if self.feature_space != feature_space_id(&self.params, &self.vocabulary) {
            return Err(CorpusLoadError::Inconsistent(
                "feature space id does not match the vocabulary".to_string(),
            ));
        }
        Ok(())
    }
}

/// A record left out of the corpus, with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub origin: String,
    pub reason: RecordError,
}

/// Outcome of one corpus build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: Vec<SkippedRecord>,
    pub dims: usize,
    pub categories: usize,
    pub terms: usize,
}

/// Accumulates validated records and builds a [`Corpus`] from them.
///
/// Malformed records are skipped with a warning rather than aborting the
/// whole load. The first record with a given id wins; later duplicates are
/// skipped.
pub struct CorpusBuilder<'a> {
    analyzer: &'a Analyzer,
    params: VectorizerParams,
    records: Vec<ValidRecord>,
    seen_ids: HashSet<String>,
    skipped: Vec<SkippedRecord>,
}

impl<'a> CorpusBuilder<'a> {
    pub fn new(analyzer: &'a Analyzer, params: VectorizerParams) -> Self {
        Self {
            analyzer,
            params,
            records: Vec::new(),
            seen_ids: HashSet::new(),
            skipped: Vec::new(),
        }
    }

    /// Validate and queue one record. `origin` names its source location and
    /// doubles as its id when the record has none.
    pub fn push(&mut self, origin: &str, record: ArticleRecord) {
        match record.validate(origin) {
            Ok(valid) => {
                if self.seen_ids.insert(valid.id.clone()) {
                    self.records.push(valid);
                } else {
                    self.skip(origin, RecordError::DuplicateId(valid.id));
                }
            }
            Err(reason) => self.skip(origin, reason),
        }
    }

    /// Record a skipped input.
    pub fn skip(&mut self, origin: impl Into<String>, reason: RecordError) {
        let origin = origin.into();
        warn!(origin = %origin, reason = %reason, "skipping article record");
        self.skipped.push(SkippedRecord { origin, reason });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fit the vocabulary and vectorize every queued record.
    pub fn build(self) -> Result<(Corpus, LoadSummary), CorpusLoadError> {
        self.params.validate()?;

        let term_lists: Vec<Vec<String>> = self
            .records
            .iter()
            .map(|r| {
                let tokens = self
                    .analyzer
                    .tokenize(&format!("{}\n{}", r.title, r.body));
                ngrams(&tokens, self.params.ngram_max)
            })
            .collect();
        let cleaned: Vec<String> = self.records.iter().map(|r| clean_text(&r.body)).collect();
        let detected: Vec<BTreeSet<String>> = self
            .records
            .iter()
            .zip(&cleaned)
            .map(|(r, body)| {
                self.analyzer
                    .detect_categories(&format!("{}\n{}", r.title, body))
            })
            .collect();
        let categories: BTreeSet<String> = self
            .records
            .iter()
            .map(|r| r.category.clone())
            .chain(detected.iter().flatten().cloned())
            .collect();

        let vocabulary = Vocabulary::fit(&term_lists, categories, &self.params);

        let mut articles = BTreeMap::new();
        let inputs = term_lists.iter().zip(cleaned).zip(detected);
        for (record, ((terms, body), detected)) in self.records.into_iter().zip(inputs) {
            let axes = std::iter::once(record.category.as_str())
                .chain(detected.iter().map(String::as_str));
            let vector = vocabulary.vector_for(&self.params, axes, terms);
            let entities = self.analyzer.extract_entities(&body);
            let article = Article {
                id: record.id,
                title: record.title,
                body: record.body,
                category: record.category,
                tags: record.tags,
                detected_categories: detected,
                url: record.url,
                published_at: record.published_at,
                entities,
                vector,
            };
            articles.insert(article.id.clone(), Arc::new(article));
        }

        let summary = LoadSummary {
            loaded: articles.len(),
            skipped: self.skipped,
            dims: vocabulary.dims(),
            categories: vocabulary.categories.len(),
            terms: vocabulary.term_count(),
        };
        info!(
            loaded = summary.loaded,
            skipped = summary.skipped.len(),
            dims = summary.dims,
            "corpus built"
        );

        Ok((
            Corpus {
                version: 0,
                feature_space: feature_space_id(&self.params, &vocabulary),
                params: self.params,
                vocabulary,
                articles,
            },
            summary,
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn params() -> VectorizerParams {
        VectorizerParams {
            min_df: 1,
            max_df: 1.0,
            ngram_max: 1,
            ..VectorizerParams::default()
        }
    }

    pub(crate) fn record(id: &str, category: &str, body: &str) -> ArticleRecord {
        ArticleRecord {
            id: Some(id.to_string()),
            title: Some(format!("Article {}", id)),
            body: Some(body.to_string()),
            category: Some(category.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn build(records: Vec<ArticleRecord>) -> Corpus {
        let analyzer = Analyzer::default();
        let mut builder = CorpusBuilder::new(&analyzer, params());
        for (i, r) in records.into_iter().enumerate() {
            builder.push(&format!("file{}.json", i), r);
        }
        builder.build().unwrap().0
    }

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_params_validation() {
        assert!(VectorizerParams::default().validate().is_ok());
        let bad = VectorizerParams {
            max_df: 0.0,
            ..VectorizerParams::default()
        };
        assert!(matches!(bad.validate(), Err(CorpusLoadError::InvalidParams(_))));
        let bad = VectorizerParams {
            category_weight: 0.0,
            text_weight: 0.0,
            ..VectorizerParams::default()
        };
        assert!(bad.validate().is_err());
        let bad = VectorizerParams {
            ngram_max: 0,
            ..VectorizerParams::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_vocabulary_df_filters() {
        let docs = vec![
            vec!["arte".to_string(), "museo".to_string()],
            vec!["arte".to_string(), "fútbol".to_string()],
            vec!["arte".to_string(), "museo".to_string()],
        ];
        let p = VectorizerParams {
            min_df: 2,
            max_df: 0.9,
            ..params()
        };
        let vocab = Vocabulary::fit(&docs, BTreeSet::new(), &p);
        // "arte" is in every document (> 90%), "fútbol" in only one.
        let terms: Vec<&String> = vocab.terms.keys().collect();
        assert_eq!(terms, vec!["museo"]);
        let expected_idf = (4.0f32 / 3.0).ln() + 1.0;
        assert!((vocab.idf[0] - expected_idf).abs() < 1e-6);
    }

    #[test]
    fn test_vocabulary_max_features_prefers_frequent_then_alphabetical() {
        let docs = vec![vec![
            "b".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ]];
        let p = VectorizerParams {
            max_features: 2,
            ..params()
        };
        let vocab = Vocabulary::fit(&docs, BTreeSet::new(), &p);
        let terms: Vec<&String> = vocab.terms.keys().collect();
        assert_eq!(terms, vec!["a", "b"]);
    }

    #[test]
    fn test_article_vectors_are_unit_length() {
        let corpus = build(vec![
            record("a", "Tecnología", "Nuevos procesadores y chips"),
            record("b", "Deportes", "Final del campeonato de fútbol"),
        ]);
        assert_eq!(corpus.len(), 2);
        for article in corpus.articles() {
            assert_eq!(article.vector.len(), corpus.dims());
            assert!((norm(&article.vector) - 1.0).abs() < 1e-5);
        }
        let cats: Vec<&str> = corpus.vocabulary().categories().collect();
        assert_eq!(cats, vec!["deportes", "tecnología"]);
    }

    #[test]
    fn test_builder_skips_malformed_and_duplicates() {
        let analyzer = Analyzer::default();
        let mut builder = CorpusBuilder::new(&analyzer, params());
        builder.push("a.json", record("a", "arte", "pintura"));
        builder.push("dup.json", record("a", "arte", "escultura"));
        builder.push(
            "no_body.json",
            ArticleRecord {
                title: Some("x".into()),
                category: Some("arte".into()),
                ..Default::default()
            },
        );
        builder.skip("broken.json", RecordError::InvalidJson("eof".into()));

        let (corpus, summary) = builder.build().unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.article("a").unwrap().body, "pintura");
        assert_eq!(summary.loaded, 1);
        let reasons: Vec<(&str, &RecordError)> = summary
            .skipped
            .iter()
            .map(|s| (s.origin.as_str(), &s.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("dup.json", &RecordError::DuplicateId("a".into())),
                ("no_body.json", &RecordError::MissingField("body".into())),
                ("broken.json", &RecordError::InvalidJson("eof".into())),
            ]
        );
    }

    #[test]
    fn test_build_rejects_invalid_params() {
        let analyzer = Analyzer::default();
        let builder = CorpusBuilder::new(
            &analyzer,
            VectorizerParams {
                min_df: 0,
                ..params()
            },
        );
        assert!(matches!(
            builder.build(),
            Err(CorpusLoadError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_empty_build() {
        let analyzer = Analyzer::default();
        let (corpus, summary) = CorpusBuilder::new(&analyzer, params()).build().unwrap();
        assert!(corpus.is_empty());
        assert_eq!(corpus.dims(), 0);
        assert_eq!(summary.loaded, 0);
    }

    #[test]
    fn test_vector_for_ignores_unknown_and_is_zero_when_empty() {
        let corpus = build(vec![record("a", "arte", "pintura mural")]);
        let v = corpus
            .vocabulary()
            .vector_for(corpus.params(), ["cocina"], &["inexistente".to_string()]);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_category_counts() {
        let corpus = build(vec![
            record("a", "arte", "pintura"),
            record("b", "Arte", "escultura"),
            record("c", "ciencia", "átomos"),
        ]);
        let counts = corpus.category_counts();
        assert_eq!(counts.get("arte"), Some(&2));
        assert_eq!(counts.get("ciencia"), Some(&1));
    }

    #[test]
    fn test_detected_categories_get_axes() {
        let corpus = build(vec![
            record("a", "internacional", "Cumbre sobre inflación y vacunas"),
            record("b", "deportes", "Gran final"),
        ]);
        let a = corpus.article("a").unwrap();
        let detected: Vec<&str> = a.detected_categories.iter().map(String::as_str).collect();
        assert_eq!(detected, vec!["economía", "salud"]);
        assert!(a.labels().contains("salud"));

        let cats: Vec<&str> = corpus.vocabulary().categories().collect();
        assert_eq!(cats, vec!["deportes", "economía", "internacional", "salud"]);
        // Primary plus two detected axes, equally weighted.
        let category_block = &a.vector[..4];
        let lit = category_block.iter().filter(|x| **x > 0.0).count();
        assert_eq!(lit, 3);
        assert_eq!(corpus.category_counts().get("salud"), None);
    }

    #[test]
    fn test_feature_space_identifies_axes_not_version() {
        let first = build(vec![
            record("a", "arte", "alfa beta"),
            record("b", "ciencia", "gamma delta"),
        ]);
        let again = build(vec![
            record("a", "arte", "alfa beta"),
            record("b", "ciencia", "gamma delta"),
        ])
        .with_version(7);
        assert_eq!(first.feature_space(), again.feature_space());
        assert_eq!(first.feature_space().len(), 64);

        // Same number of dimensions, different category axes.
        let relabelled = build(vec![
            record("a", "zoología", "alfa beta"),
            record("b", "arte", "gamma delta"),
        ]);
        assert_eq!(first.dims(), relabelled.dims());
        assert_ne!(first.feature_space(), relabelled.feature_space());

        let reweighted = Corpus::empty(VectorizerParams {
            text_weight: 2.0,
            ..params()
        });
        assert_ne!(Corpus::empty(params()).feature_space(), reweighted.feature_space());
    }

    #[test]
    fn test_check_consistency() {
        let corpus = build(vec![
            record("a", "tecnología", "chips y procesadores"),
            record("b", "deportes", "fútbol"),
        ]);
        assert!(corpus.check_consistency().is_ok());
        assert!(Corpus::empty(params()).check_consistency().is_ok());

        let mut no_idf = corpus.clone();
        no_idf.vocabulary.idf.clear();
        assert!(matches!(
            no_idf.check_consistency(),
            Err(CorpusLoadError::Inconsistent(_))
        ));

        let mut short_vector = corpus.clone();
        let mut article = (**short_vector.article("a").unwrap()).clone();
        article.vector.pop();
        short_vector.articles.insert("a".into(), Arc::new(article));
        assert!(matches!(
            short_vector.check_consistency(),
            Err(CorpusLoadError::Inconsistent(_))
        ));

        let mut bad_axis = corpus.clone();
        bad_axis.vocabulary.categories.insert("zzz".into(), 0);
        assert!(bad_axis.check_consistency().is_err());

        let mut bad_id = corpus.clone();
        bad_id.feature_space = "0".repeat(64);
        assert!(bad_id.check_consistency().is_err());

        let mut bad_params = corpus;
        bad_params.params.min_df = 0;
        assert!(matches!(
            bad_params.check_consistency(),
            Err(CorpusLoadError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_corpus_serde_roundtrip_preserves_vectors() {
        let corpus = build(vec![record("a", "arte", "pintura mural")]);
        let json = serde_json::to_string(&corpus).unwrap();
        let back: Corpus = serde_json::from_str(&json).unwrap();
        assert_eq!(back.vocabulary(), corpus.vocabulary());
        assert_eq!(back.article("a"), corpus.article("a"));
        assert_eq!(back.feature_space(), corpus.feature_space());
        assert!(back.check_consistency().is_ok());
    }
}
