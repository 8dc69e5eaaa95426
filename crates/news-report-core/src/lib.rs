//! # News Report Core
//!
//! Pure logic for news-report: data models, text analysis, the versioned
//! corpus index, profile vectorization, ranking, summarization, and report
//! assembly.
//!
//! This crate performs no filesystem or network I/O. Records come in from
//! the application's loader; profiles and reports go back out to the caller
//! for persistence and rendering.
//!
//! ## Pipeline
//!
//! ```text
//! ArticleRecord ──▶ CorpusBuilder ──▶ Corpus ──▶ CorpusHandle (swap)
//!                                        │
//!   categories + free text ──▶ ProfileVectorizer ──▶ Profile
//!                                        │
//!                           rank(profile, corpus) ──▶ [RankedResult]
//!                                        │
//!                          ReportAssembler::assemble ──▶ Report
//! ```

pub mod corpus;
pub mod error;
pub mod models;
pub mod nlp;
pub mod rank;
pub mod render;
pub mod report;
pub mod summarize;
pub mod vectorize;

pub use corpus::{
    Corpus, CorpusBuilder, CorpusHandle, LoadSummary, SkippedRecord, VectorizerParams,
};
pub use error::{AssemblyError, CorpusLoadError, RecordError, VectorizationError};
pub use models::{Article, ArticleRecord, Entity, Profile, RankedResult, SourceMetadata};
pub use nlp::{Analyzer, CategoryAnnotator, RegexCategoryAnnotator};
pub use rank::rank;
pub use render::render_text;
pub use report::{Narrative, ProfileSummary, Report, ReportAssembler, ReportItem, ReportSettings};
pub use summarize::Summarizer;
pub use vectorize::{CategoryPolicy, ProfileVectorizer};
