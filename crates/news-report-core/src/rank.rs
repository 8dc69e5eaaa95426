//! Recommendation ranking.
//!
//! Scores every article in a corpus snapshot by cosine similarity against a
//! profile vector and returns them best first. Ranking never mutates the
//! corpus or the profile.
//!
//! A profile built in another feature space scores 0 against every article,
//! even when the vector lengths agree.

use std::cmp::Ordering;
use std::sync::Arc;
use tracing::warn;

use crate::corpus::Corpus;
use crate::models::{Profile, RankedResult};

/// Compute cosine similarity between two feature vectors.
///
/// Returns `0.0` for empty vectors, zero vectors, or vectors of different
/// lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Rank every article in `corpus` against `profile`.
///
/// Results are ordered by descending score, ties broken by ascending article
/// id. `limit` truncates after sorting; `None` returns the whole corpus.
pub fn rank(profile: &Profile, corpus: &Corpus, limit: Option<usize>) -> Vec<RankedResult> {
    let current = profile.is_current_for(corpus);
    if !current && !corpus.is_empty() {
        warn!(
            profile_version = profile.corpus_version,
            corpus_version = corpus.version(),
            profile_dims = profile.vector.len(),
            corpus_dims = corpus.dims(),
            "profile was vectorized in a different feature space; scoring as 0"
        );
    }

    let mut results: Vec<RankedResult> = corpus
        .articles()
        .map(|article| RankedResult {
            score: if current {
                cosine_similarity(&profile.vector, &article.vector)
            } else {
                0.0
            },
            article: Arc::clone(article),
        })
        .collect();

    results.sort_by(compare);
    if let Some(n) = limit {
        results.truncate(n);
    }
    results
}

fn compare(a: &RankedResult, b: &RankedResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.article.id.cmp(&b.article.id))
}
