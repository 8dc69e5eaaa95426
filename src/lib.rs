//! # News Report
//!
//! Personalized news reports from a local article corpus.
//!
//! Articles are loaded from JSON files into a versioned in-memory index.
//! A reader's selected categories and free-text interests become a profile
//! vector in the same feature space. Ranking the corpus against that profile
//! yields the articles that go into a report, each with a personalized
//! summary and the reasons it matched.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐
//! │ JSON files   │──▶│ loader/cache │──▶│ CorpusHandle  │
//! │ [corpus]     │   │ TF-IDF build │   │ (Arc swap)    │
//! └──────────────┘   └──────────────┘   └──────┬────────┘
//!                                              │
//!                          ┌───────────────────┤
//!                          ▼                   ▼
//!                     ┌──────────┐       ┌──────────┐
//!                     │   CLI    │       │   HTTP   │
//!                     │  (nr)    │       │  (axum)  │
//!                     └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! nr build                                   # build (or refresh) the corpus cache
//! nr categories                              # list known categories
//! nr recommend --category tecnología --interests "inteligencia artificial"
//! nr serve                                   # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`loader`] | Filesystem corpus loader and source fingerprint |
//! | [`cache`] | On-disk corpus cache |
//! | [`service`] | Coordinating service (corpus, profiles, reports) |
//! | [`server`] | JSON HTTP API |
//! | [`logging`] | Tracing subscriber setup |
//!
//! The pure pipeline (models, vectorizer, ranker, assembler) lives in the
//! `news-report-core` crate.

pub mod cache;
pub mod config;
pub mod loader;
pub mod logging;
pub mod server;
pub mod service;
