//! TOML configuration.
//!
//! ```toml
//! [corpus]
//! root = "./data/articles"
//! include_globs = ["**/*.json"]
//! cache_path = "./data/corpus.cache.json"
//!
//! [vectorizer]
//! max_features = 3000
//! unknown_categories = "ignore"
//!
//! [report]
//! max_articles = 5
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```
//!
//! Only `[corpus].root` is required; every other value has a default.

use anyhow::{Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use news_report_core::{CategoryPolicy, ReportSettings, VectorizerParams};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub vectorizer: VectorizerConfig,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Directory holding the article JSON files.
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Where the built corpus is cached between runs. No caching when unset.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.json".to_string()]
}

/// `[vectorizer]`: the [`VectorizerParams`] fields inline, plus the
/// profile-side policy.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct VectorizerConfig {
    #[serde(flatten)]
    pub params: VectorizerParams,
    /// `ignore` (default) or `reject`.
    #[serde(default)]
    pub unknown_categories: CategoryPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate corpus
    if config.corpus.root.as_os_str().is_empty() {
        anyhow::bail!("corpus.root must not be empty");
    }
    if config.corpus.include_globs.is_empty() {
        anyhow::bail!("corpus.include_globs must contain at least one pattern");
    }
    for pattern in config
        .corpus
        .include_globs
        .iter()
        .chain(config.corpus.exclude_globs.iter())
    {
        Glob::new(pattern).with_context(|| format!("Invalid glob pattern: '{}'", pattern))?;
    }

    // Validate vectorizer
    config
        .vectorizer
        .params
        .validate()
        .map_err(|e| anyhow::anyhow!("vectorizer: {}", e))?;

    // Validate report
    if config.report.max_articles == 0 {
        anyhow::bail!("report.max_articles must be >= 1");
    }
    if config.report.summary_sentences == 0 {
        anyhow::bail!("report.summary_sentences must be >= 1");
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nr.toml");
        std::fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let (_tmp, path) = write("[corpus]\nroot = \"./articles\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.corpus.include_globs, vec!["**/*.json"]);
        assert!(config.corpus.cache_path.is_none());
        assert_eq!(config.vectorizer.params, VectorizerParams::default());
        assert_eq!(config.vectorizer.unknown_categories, CategoryPolicy::Ignore);
        assert_eq!(config.report, ReportSettings::default());
        assert_eq!(config.server.bind, "127.0.0.1:7340");
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_full_config() {
        let (_tmp, path) = write(
            r#"
[corpus]
root = "/srv/articles"
exclude_globs = ["drafts/**"]
cache_path = "/tmp/cache.json"

[vectorizer]
min_df = 1
max_df = 1
ngram_max = 1
category_weight = 2.0
unknown_categories = "reject"

[report]
max_articles = 3
title = "Daily Brief"
"#,
        );
        let config = load_config(&path).unwrap();
        let params = &config.vectorizer.params;
        assert_eq!(params.min_df, 1);
        assert_eq!(params.max_df, 1.0);
        assert_eq!(params.ngram_max, 1);
        assert_eq!(params.category_weight, 2.0);
        assert_eq!(params.max_features, VectorizerParams::default().max_features);
        assert!(params.sublinear_tf);
        assert_eq!(config.vectorizer.unknown_categories, CategoryPolicy::Reject);
        assert_eq!(config.report.max_articles, 3);
        assert_eq!(config.report.summary_sentences, 3);
        assert_eq!(config.report.title, "Daily Brief");
    }

    #[test]
    fn test_invalid_values_rejected() {
        for bad in [
            "[corpus]\nroot = \"a\"\ninclude_globs = []\n",
            "[corpus]\nroot = \"a\"\ninclude_globs = [\"[\"]\n",
            "[corpus]\nroot = \"a\"\n[vectorizer]\nmax_df = 1.5\n",
            "[corpus]\nroot = \"a\"\n[vectorizer]\nunknown_categories = \"maybe\"\n",
            "[corpus]\nroot = \"a\"\n[report]\nmax_articles = 0\n",
            "[vectorizer]\nmin_df = 1\n",
        ] {
            let (_tmp, path) = write(bad);
            assert!(load_config(&path).is_err(), "accepted: {}", bad);
        }
    }

    #[test]
    fn test_vectorizer_section_maps_onto_params() {
        let (_tmp, path) = write(
            r#"
[corpus]
root = "a"

[vectorizer]
max_features = 500
sublinear_tf = false
text_weight = 0.5
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(
            config.vectorizer.params,
            VectorizerParams {
                max_features: 500,
                sublinear_tf: false,
                text_weight: 0.5,
                ..VectorizerParams::default()
            }
        );
        assert_eq!(config.vectorizer.unknown_categories, CategoryPolicy::Ignore);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/nr.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
