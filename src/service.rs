//! The coordinating component.
//!
//! [`ReportService`] owns the configuration, the swappable corpus, the
//! profile vectorizer and the report assembler. The CLI and the HTTP server
//! both drive the pipeline through it:
//!
//! ```text
//! open/reload ─▶ scan ─▶ cache hit? ──yes──▶ install
//!                           │ no
//!                           ▼
//!                         build ─▶ write cache ─▶ install
//!
//! create_profile ─▶ Profile
//! generate_report(profile) ─▶ refresh if stale ─▶ rank ─▶ assemble ─▶ Report
//! ```

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use news_report_core::{
    rank, Analyzer, Corpus, CorpusHandle, LoadSummary, Narrative, Profile, ProfileVectorizer,
    RankedResult, Report, ReportAssembler, ReportSettings,
};

use crate::cache;
use crate::config::Config;
use crate::loader;

/// Where an installed corpus came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusOrigin {
    Cache,
    Built,
}

impl fmt::Display for CorpusOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CorpusOrigin::Cache => "cache",
            CorpusOrigin::Built => "built",
        })
    }
}

/// Result of installing a corpus.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadOutcome {
    pub version: u64,
    pub origin: CorpusOrigin,
    pub summary: LoadSummary,
}

/// Per-request report options.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub recipient: Option<String>,
    /// Overrides `[report].max_articles`.
    pub limit: Option<usize>,
    pub introduction: Option<String>,
    pub closing: Option<String>,
}

pub struct ReportService {
    config: Config,
    analyzer: Analyzer,
    corpus: CorpusHandle,
    vectorizer: ProfileVectorizer,
    assembler: ReportAssembler,
}

impl ReportService {
    /// Load the corpus and set up the pipeline. The cache is used when
    /// present and current, unless `force` is set.
    pub fn open(config: Config, force: bool) -> Result<(Self, ReloadOutcome)> {
        let analyzer = Analyzer::default();
        let (corpus, summary, origin) = load(&config, &analyzer, force)?;
        let handle = CorpusHandle::new(corpus);
        let outcome = ReloadOutcome {
            version: handle.version(),
            origin,
            summary,
        };

        let service = Self {
            vectorizer: ProfileVectorizer::new(
                analyzer.clone(),
                config.vectorizer.unknown_categories,
            ),
            assembler: ReportAssembler::new(config.report.clone()),
            analyzer,
            corpus: handle,
            config,
        };
        Ok((service, outcome))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rebuild the corpus and swap it in.
    ///
    /// On error the previously installed corpus stays in effect.
    pub fn reload(&self, force: bool) -> Result<ReloadOutcome> {
        let (corpus, summary, origin) = load(&self.config, &self.analyzer, force)?;
        let installed = self.corpus.replace(corpus);
        info!(version = installed.version(), origin = ?origin, "corpus installed");
        Ok(ReloadOutcome {
            version: installed.version(),
            origin,
            summary,
        })
    }

    pub fn snapshot(&self) -> Arc<Corpus> {
        self.corpus.snapshot()
    }

    /// Article counts per category in the current corpus.
    pub fn categories(&self) -> BTreeMap<String, usize> {
        self.snapshot().category_counts()
    }

    /// Vectorize a profile against the current corpus.
    pub fn create_profile<I, S>(&self, categories: I, free_text: &str) -> Result<Profile>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let corpus = self.snapshot();
        Ok(self.vectorizer.vectorize(categories, free_text, &corpus)?)
    }

    /// Rank the current corpus for `profile`.
    pub fn rank(&self, profile: &Profile, limit: Option<usize>) -> Result<Vec<RankedResult>> {
        let corpus = self.snapshot();
        let profile = self.current_profile(profile, &corpus)?;
        Ok(rank(&profile, &corpus, limit))
    }

    /// Rank and assemble a report against one corpus snapshot.
    pub fn generate_report(&self, profile: &Profile, request: ReportRequest) -> Result<Report> {
        let corpus = self.snapshot();
        let profile = self.current_profile(profile, &corpus)?;
        let ranked = rank(&profile, &corpus, None);

        let narrative = Narrative {
            report_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            recipient: request.recipient,
            introduction: request.introduction,
            closing: request.closing,
        };

        let report = match request.limit {
            Some(max_articles) => ReportAssembler::new(ReportSettings {
                max_articles,
                ..self.config.report.clone()
            })
            .assemble(&profile, &ranked, &corpus, narrative)?,
            None => self.assembler.assemble(&profile, &ranked, &corpus, narrative)?,
        };

        info!(
            report_id = %report.id,
            corpus_version = report.corpus_version,
            items = report.items.len(),
            "report generated"
        );
        Ok(report)
    }

    /// `profile` itself when it was built in `corpus`'s feature space,
    /// otherwise a copy re-vectorized from its raw inputs.
    ///
    /// The feature-space id is compared rather than the version, so a profile
    /// stored by an earlier process is refreshed whenever the corpus it was
    /// built against differs from the one installed now.
    fn current_profile<'a>(
        &self,
        profile: &'a Profile,
        corpus: &Corpus,
    ) -> Result<Cow<'a, Profile>> {
        if profile.is_current_for(corpus) {
            return Ok(Cow::Borrowed(profile));
        }
        info!(
            from = %profile.feature_space,
            to = %corpus.feature_space(),
            corpus_version = corpus.version(),
            "re-vectorizing profile built in another feature space"
        );
        Ok(Cow::Owned(self.vectorizer.refresh(profile, corpus)?))
    }
}

fn load(
    config: &Config,
    analyzer: &Analyzer,
    force: bool,
) -> Result<(Corpus, LoadSummary, CorpusOrigin)> {
    let params = config.vectorizer.params.clone();
    let files = loader::scan_corpus(&config.corpus)?;
    let fingerprint = loader::fingerprint(&files, &params);

    if let Some(path) = &config.corpus.cache_path {
        if !force {
            if let Some((corpus, skipped)) = cache::read_cache(path, &fingerprint) {
                info!(
                    path = %path.display(),
                    articles = corpus.len(),
                    skipped = skipped.len(),
                    "corpus loaded from cache"
                );
                let summary = LoadSummary {
                    loaded: corpus.len(),
                    skipped,
                    dims: corpus.dims(),
                    categories: corpus.vocabulary().categories().count(),
                    terms: corpus.vocabulary().term_count(),
                };
                return Ok((corpus, summary, CorpusOrigin::Cache));
            }
        }
    }

    let (corpus, summary) = loader::build_corpus(&files, analyzer, params)?;

    if let Some(path) = &config.corpus.cache_path {
        if let Err(e) = cache::write_cache(path, &fingerprint, &corpus, &summary.skipped) {
            warn!(error = %e, "failed to write corpus cache");
        }
    }

    Ok((corpus, summary, CorpusOrigin::Built))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{CorpusConfig, LoggingConfig, ServerConfig, VectorizerConfig};
    use news_report_core::{CategoryPolicy, RecordError, VectorizationError, VectorizerParams};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    pub(crate) fn write_article(root: &Path, id: &str, category: &str, body: &str) {
        let record = serde_json::json!({
            "id": id,
            "title": format!("Article {}", id),
            "body": body,
            "category": category,
        });
        fs::write(root.join(format!("{}.json", id)), record.to_string()).unwrap();
    }

    pub(crate) fn test_config(root: &Path) -> Config {
        Config {
            corpus: CorpusConfig {
                root: root.join("articles"),
                include_globs: vec!["**/*.json".to_string()],
                exclude_globs: vec![],
                follow_symlinks: false,
                cache_path: Some(root.join("cache/corpus.json")),
            },
            vectorizer: VectorizerConfig {
                params: VectorizerParams {
                    min_df: 1,
                    max_df: 1.0,
                    ..VectorizerParams::default()
                },
                ..VectorizerConfig::default()
            },
            report: ReportSettings::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub(crate) fn setup() -> (TempDir, Config) {
        let tmp = TempDir::new().unwrap();
        let articles = tmp.path().join("articles");
        fs::create_dir_all(&articles).unwrap();
        write_article(&articles, "A", "tecnología", "Nuevos procesadores y chips.");
        write_article(&articles, "B", "deportes", "Gran final de fútbol.");
        let config = test_config(tmp.path());
        (tmp, config)
    }

    #[test]
    fn test_open_builds_then_uses_cache() {
        let (_tmp, config) = setup();
        let (service, outcome) = ReportService::open(config.clone(), false).unwrap();
        assert_eq!(outcome.origin, CorpusOrigin::Built);
        assert_eq!(outcome.version, 1);
        assert_eq!(service.snapshot().len(), 2);

        let (_, outcome) = ReportService::open(config, false).unwrap();
        assert_eq!(outcome.origin, CorpusOrigin::Cache);
        assert_eq!(outcome.summary.loaded, 2);
    }

    #[test]
    fn test_cache_hit_reports_skipped_records() {
        let (tmp, config) = setup();
        fs::write(tmp.path().join("articles/broken.json"), "{ not json").unwrap();

        let (_, built) = ReportService::open(config.clone(), false).unwrap();
        assert_eq!(built.origin, CorpusOrigin::Built);
        assert_eq!(built.summary.skipped.len(), 1);

        let (_, cached) = ReportService::open(config, false).unwrap();
        assert_eq!(cached.origin, CorpusOrigin::Cache);
        assert_eq!(cached.summary.loaded, 2);
        assert_eq!(cached.summary.skipped.len(), 1);
        assert_eq!(cached.summary.skipped[0].origin, "broken.json");
        assert!(matches!(
            cached.summary.skipped[0].reason,
            RecordError::InvalidJson(_)
        ));
    }

    #[test]
    fn test_stored_profile_refreshed_after_restart_with_edited_corpus() {
        let tmp = TempDir::new().unwrap();
        let articles = tmp.path().join("articles");
        fs::create_dir_all(&articles).unwrap();
        write_article(&articles, "A", "tecnología", "Alpha beta gamma.");
        write_article(&articles, "B", "deportes", "Delta epsilon zeta.");
        let config = test_config(tmp.path());

        let stored = {
            let (service, _) = ReportService::open(config.clone(), false).unwrap();
            let profile = service.create_profile(["tecnología"], "").unwrap();
            serde_json::to_string(&profile).unwrap()
        };

        // Recategorized between runs: same dimension count, different axes.
        write_article(&articles, "A", "zoología", "Alpha beta gamma.");
        write_article(&articles, "B", "tecnología", "Delta epsilon zeta.");
        let (service, outcome) = ReportService::open(config, false).unwrap();
        assert_eq!(outcome.origin, CorpusOrigin::Built);
        assert_eq!(outcome.version, 1);

        let profile: Profile = serde_json::from_str(&stored).unwrap();
        assert_eq!(profile.corpus_version, 1);
        assert_eq!(profile.vector.len(), service.snapshot().dims());
        assert_ne!(profile.feature_space, service.snapshot().feature_space());

        let report = service
            .generate_report(&profile, ReportRequest::default())
            .unwrap();
        assert_eq!(report.items[0].article_id, "B");
        assert!(report.items[0].score > 0.0);
        assert_eq!(report.items[1].score, 0.0);
    }

    #[test]
    fn test_reload_sees_new_article_and_force_bypasses_cache() {
        let (tmp, config) = setup();
        let (service, _) = ReportService::open(config, false).unwrap();
        let profile = service.create_profile(["tecnología"], "").unwrap();
        let before = service.snapshot();

        write_article(&tmp.path().join("articles"), "C", "tecnología", "Chips cuánticos.");
        let outcome = service.reload(false).unwrap();
        assert_eq!(outcome.origin, CorpusOrigin::Built);
        assert_eq!(outcome.version, 2);

        let forced = service.reload(true).unwrap();
        assert_eq!(forced.origin, CorpusOrigin::Built);
        assert_eq!(forced.version, 3);

        // The old snapshot never sees C; the stale profile is refreshed.
        assert!(before.article("C").is_none());
        let ids: Vec<String> = service
            .rank(&profile, None)
            .unwrap()
            .iter()
            .map(|r| r.article.id.clone())
            .collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&"C".to_string()));
        assert_eq!(ids[2], "B");
    }

    #[test]
    fn test_failed_reload_keeps_previous_corpus() {
        let (tmp, config) = setup();
        let (service, _) = ReportService::open(config, false).unwrap();
        fs::remove_dir_all(tmp.path().join("articles")).unwrap();

        let err = service.reload(true).unwrap_err();
        assert!(err
            .downcast_ref::<news_report_core::CorpusLoadError>()
            .is_some());
        assert_eq!(service.snapshot().version(), 1);
        assert_eq!(service.snapshot().len(), 2);
    }

    #[test]
    fn test_generate_report() {
        let (_tmp, config) = setup();
        let (service, _) = ReportService::open(config, false).unwrap();
        let profile = service.create_profile(["Tecnología"], "chips").unwrap();

        let report = service
            .generate_report(
                &profile,
                ReportRequest {
                    recipient: Some("Ana".into()),
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].article_id, "A");
        assert_eq!(report.total_ranked, 2);
        assert_eq!(report.corpus_version, 1);
        assert!(uuid::Uuid::parse_str(&report.id).is_ok());
    }

    #[test]
    fn test_reject_policy_surfaces_typed_error() {
        let (_tmp, mut config) = setup();
        config.vectorizer.unknown_categories = CategoryPolicy::Reject;
        let (service, _) = ReportService::open(config, false).unwrap();
        let err = service.create_profile(["cocina"], "").unwrap_err();
        assert_eq!(
            err.downcast_ref::<VectorizationError>(),
            Some(&VectorizationError::UnknownCategory {
                category: "cocina".into()
            })
        );
    }
}
