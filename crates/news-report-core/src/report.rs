//! Report assembly.
//!
//! [`ReportAssembler::assemble`] packages a ranked list into a [`Report`]:
//! the top articles with personalized summaries and the reasons each one
//! matched, plus the narrative text around them. Assembly is pure: the
//! caller supplies the report id and generation time, and owns the result
//! for persistence or rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::corpus::Corpus;
use crate::error::AssemblyError;
use crate::models::{Entity, Profile, RankedResult};
use crate::summarize::{clean_text, Summarizer};

/// Knobs for report assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// How many ranked articles make it into the report.
    pub max_articles: usize,
    /// Sentences per article summary.
    pub summary_sentences: usize,
    pub title: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            max_articles: 5,
            summary_sentences: 3,
            title: "Personalized News Report".to_string(),
        }
    }
}

/// Caller-supplied narrative inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Narrative {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub recipient: Option<String>,
    /// Replaces the generated introduction when set.
    pub introduction: Option<String>,
    pub closing: Option<String>,
}

impl Narrative {
    pub fn new(report_id: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            report_id: report_id.into(),
            generated_at,
            recipient: None,
            introduction: None,
            closing: None,
        }
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }
}

/// The parts of a profile shown in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub categories: Vec<String>,
    /// Categories detected in the free text.
    #[serde(default)]
    pub detected_categories: Vec<String>,
    pub entities: Vec<Entity>,
    pub keywords: Vec<String>,
    pub profile_text: String,
}

/// One recommended article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportItem {
    /// 1-based position in the report.
    pub rank: usize,
    pub article_id: String,
    pub title: String,
    pub category: String,
    pub url: Option<String>,
    pub published_at: Option<String>,
    pub score: f32,
    pub summary: String,
    /// Profile categories (selected or detected) found among the article's
    /// labels.
    pub matching_categories: Vec<String>,
    /// Entity texts shared by profile and article (lowercased, sorted).
    pub matching_entities: Vec<String>,
    pub entities: Vec<Entity>,
}

/// A generated report, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub corpus_version: u64,
    pub recipient: Option<String>,
    pub introduction: String,
    pub closing: Option<String>,
    pub profile: ProfileSummary,
    /// Length of the ranked list the report was cut from.
    pub total_ranked: usize,
    pub items: Vec<ReportItem>,
}

pub struct ReportAssembler {
    settings: ReportSettings,
    summarizer: Summarizer,
}

impl ReportAssembler {
    pub fn new(settings: ReportSettings) -> Self {
        let summarizer = Summarizer::new(settings.summary_sentences);
        Self {
            settings,
            summarizer,
        }
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Build a report from `ranked`, which must come from ranking against
    /// `corpus`.
    ///
    /// Every ranked result is checked, not just the ones that make the cut,
    /// so a stale list is rejected as a whole.
    pub fn assemble(
        &self,
        profile: &Profile,
        ranked: &[RankedResult],
        corpus: &Corpus,
        narrative: Narrative,
    ) -> Result<Report, AssemblyError> {
        for result in ranked {
            validate(result, corpus)?;
        }

        let items: Vec<ReportItem> = ranked
            .iter()
            .take(self.settings.max_articles)
            .enumerate()
            .map(|(i, result)| self.item(i + 1, result, profile))
            .collect();

        let introduction = narrative
            .introduction
            .unwrap_or_else(|| default_introduction(profile, items.len(), ranked.len()));

        Ok(Report {
            id: narrative.report_id,
            title: self.settings.title.clone(),
            generated_at: narrative.generated_at,
            corpus_version: corpus.version(),
            recipient: narrative.recipient,
            introduction,
            closing: narrative.closing,
            profile: ProfileSummary {
                categories: profile.categories.iter().cloned().collect(),
                detected_categories: profile.detected_categories.iter().cloned().collect(),
                entities: profile.entities.clone(),
                keywords: profile.keywords.clone(),
                profile_text: profile.profile_text.clone(),
            },
            total_ranked: ranked.len(),
            items,
        })
    }

    fn item(&self, rank: usize, result: &RankedResult, profile: &Profile) -> ReportItem {
        let article = &result.article;
        let body = clean_text(&article.body);
        let interests = profile.interests();
        let summary = self
            .summarizer
            .summarize_for_profile(&body, interests.iter().copied());

        let labels = article.labels();
        let matching_categories = interests
            .into_iter()
            .filter(|c| labels.contains(c))
            .map(str::to_string)
            .collect();

        ReportItem {
            rank,
            article_id: article.id.clone(),
            title: article.title.clone(),
            category: article.category.clone(),
            url: article.url.clone(),
            published_at: article.published_at.clone(),
            score: result.score,
            summary,
            matching_categories,
            matching_entities: matching_entities(&profile.entities, &article.entities),
            entities: article.entities.clone(),
        }
    }
}

fn validate(result: &RankedResult, corpus: &Corpus) -> Result<(), AssemblyError> {
    let id = &result.article.id;
    match corpus.article(id) {
        None => Err(AssemblyError::UnknownArticle {
            id: id.clone(),
            corpus_version: corpus.version(),
        }),
        Some(current) if !Arc::ptr_eq(current, &result.article) => {
            Err(AssemblyError::StaleArticle {
                id: id.clone(),
                corpus_version: corpus.version(),
            })
        }
        Some(_) if !result.score.is_finite() => Err(AssemblyError::InvalidScore { id: id.clone() }),
        Some(_) => Ok(()),
    }
}

fn matching_entities(profile: &[Entity], article: &[Entity]) -> Vec<String> {
    let wanted: BTreeSet<String> = profile.iter().map(|e| e.text.to_lowercase()).collect();
    let found: BTreeSet<String> = article.iter().map(|e| e.text.to_lowercase()).collect();
    wanted.intersection(&found).cloned().collect()
}

fn default_introduction(profile: &Profile, shown: usize, total: usize) -> String {
    let focus = if profile.categories.is_empty() {
        "across all topics".to_string()
    } else {
        let joined: Vec<&str> = profile.categories.iter().map(String::as_str).collect();
        format!("based on your interest in {}", joined.join(", "))
    };
    match shown {
        0 => format!("No articles are available {} right now.", focus),
        1 => format!("Here is the top article of {} selected {}.", total, focus),
        n => format!("Here are the top {} of {} articles selected {}.", n, total, focus),
    }
}
