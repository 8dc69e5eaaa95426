//! Error taxonomy for the recommendation pipeline.
//!
//! None of these errors are retried internally. A failed corpus load leaves
//! the previously installed corpus in effect; vectorization and assembly are
//! all-or-nothing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A corpus rebuild attempt failed as a whole.
#[derive(Debug, Error)]
pub enum CorpusLoadError {
    #[error("corpus directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to read corpus path {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid vectorizer parameters: {0}")]
    InvalidParams(String),

    /// A deserialized corpus does not hold together (e.g. a damaged cache).
    #[error("inconsistent corpus: {0}")]
    Inconsistent(String),
}

/// Why a single article record was skipped during a load.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RecordError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("duplicate article id `{0}`")]
    DuplicateId(String),
}

/// Profile inputs were rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorizationError {
    #[error("unknown category `{category}`")]
    UnknownCategory { category: String },
}

/// Ranked results do not belong to the corpus they are assembled against.
///
/// This indicates a stale index was used and is an integration bug, not a
/// retryable condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    #[error("ranked article `{id}` is not in corpus version {corpus_version}")]
    UnknownArticle { id: String, corpus_version: u64 },

    #[error("ranked article `{id}` was produced against a different corpus than version {corpus_version}")]
    StaleArticle { id: String, corpus_version: u64 },

    #[error("ranked article `{id}` has a non-finite score")]
    InvalidScore { id: String },
}
