//! Filesystem corpus loader.
//!
//! Walks `[corpus].root`, applies the include/exclude globs, and feeds every
//! JSON record it finds into a [`CorpusBuilder`]. A file may hold a single
//! record object or an array of them. Records that fail to parse or
//! validate are skipped with a warning; only an unreadable root or file
//! aborts the load.
//!
//! The scan also yields the metadata used to fingerprint the source set for
//! the corpus cache (see [`crate::cache`]).

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

use news_report_core::{
    Analyzer, ArticleRecord, Corpus, CorpusBuilder, CorpusLoadError, LoadSummary, RecordError,
    VectorizerParams,
};

use crate::config::CorpusConfig;

/// Bumped whenever the fingerprint inputs change shape.
const FINGERPRINT_VERSION: &str = "news-report/corpus/v2";

/// One matching file under the corpus root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated; used as record origin.
    pub relative: String,
    pub size: u64,
    /// Modification time in nanoseconds since the epoch (0 if unknown).
    pub modified: u128,
}

/// List matching files under the corpus root, sorted by relative path.
pub fn scan_corpus(config: &CorpusConfig) -> Result<Vec<SourceFile>> {
    let root = &config.root;
    if !root.is_dir() {
        return Err(CorpusLoadError::MissingDirectory(root.clone()).into());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string(), "**/.*".to_string()];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
            CorpusLoadError::Unreadable {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        let metadata = entry.metadata().map_err(|e| CorpusLoadError::Unreadable {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|m| m.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        files.push(SourceFile {
            path: path.to_path_buf(),
            relative: rel_str,
            size: metadata.len(),
            modified,
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    debug!(root = %root.display(), files = files.len(), "scanned corpus root");

    Ok(files)
}

/// SHA-256 over the file list (path, size, mtime) and the vectorizer params.
///
/// Any change to a source file or to the feature-space parameters yields a
/// different fingerprint.
pub fn fingerprint(files: &[SourceFile], params: &VectorizerParams) -> String {
    let mut hasher = Sha256::new();
    hasher.update(FINGERPRINT_VERSION.as_bytes());
    for file in files {
        hasher.update(file.relative.as_bytes());
        hasher.update([0u8]);
        hasher.update(file.size.to_le_bytes());
        hasher.update(file.modified.to_le_bytes());
    }
    // Params serialize infallibly; an empty string still keeps the hash stable.
    let params_json = serde_json::to_string(params).unwrap_or_default();
    hasher.update(params_json.as_bytes());
    hex::encode(hasher.finalize())
}

/// Read every file and build a fresh corpus.
pub fn build_corpus(
    files: &[SourceFile],
    analyzer: &Analyzer,
    params: VectorizerParams,
) -> Result<(Corpus, LoadSummary)> {
    let mut builder = CorpusBuilder::new(analyzer, params);

    for file in files {
        let bytes = std::fs::read(&file.path).map_err(|e| CorpusLoadError::Unreadable {
            path: file.path.clone(),
            source: e,
        })?;
        push_file(&mut builder, &file.relative, &bytes);
    }

    Ok(builder.build()?)
}

/// Scan and build in one step.
pub fn load_corpus(
    config: &CorpusConfig,
    analyzer: &Analyzer,
    params: VectorizerParams,
) -> Result<(Corpus, LoadSummary)> {
    let files = scan_corpus(config)?;
    build_corpus(&files, analyzer, params)
}

fn push_file(builder: &mut CorpusBuilder<'_>, origin: &str, bytes: &[u8]) {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => {
            builder.skip(origin, RecordError::InvalidJson(e.to_string()));
            return;
        }
    };

    match value {
        Value::Array(items) => {
            for (index, item) in items.into_iter().enumerate() {
                push_value(builder, &format!("{}#{}", origin, index), item);
            }
        }
        other => push_value(builder, origin, other),
    }
}

fn push_value(builder: &mut CorpusBuilder<'_>, origin: &str, value: Value) {
    if !value.is_object() {
        builder.skip(origin, RecordError::NotAnObject);
        return;
    }
    match serde_json::from_value::<ArticleRecord>(value) {
        Ok(record) => builder.push(origin, record),
        Err(e) => builder.skip(origin, RecordError::InvalidJson(e.to_string())),
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn corpus_config(root: &Path) -> CorpusConfig {
        CorpusConfig {
            root: root.to_path_buf(),
            include_globs: vec!["**/*.json".to_string()],
            exclude_globs: vec![],
            follow_symlinks: false,
            cache_path: None,
        }
    }

    fn params() -> VectorizerParams {
        VectorizerParams {
            min_df: 1,
            max_df: 1.0,
            ..VectorizerParams::default()
        }
    }

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("tech")).unwrap();
        fs::write(
            root.join("tech/a.json"),
            r#"{"id":"a","title":"Chips","body":"Nuevos procesadores","category":"Tecnología"}"#,
        )
        .unwrap();
        fs::write(
            root.join("batch.json"),
            r#"[
                {"title":"Final","text":"Gran final de fútbol","section":"deportes"},
                {"title":"Sin cuerpo","category":"deportes"},
                42
            ]"#,
        )
        .unwrap();
        fs::write(root.join("broken.json"), "{ not json").unwrap();
        fs::write(root.join("notes.txt"), "ignored").unwrap();
        tmp
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let tmp = setup();
        let files = scan_corpus(&corpus_config(tmp.path())).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(names, vec!["batch.json", "broken.json", "tech/a.json"]);
    }

    #[test]
    fn test_scan_excludes() {
        let tmp = setup();
        let mut config = corpus_config(tmp.path());
        config.exclude_globs = vec!["tech/**".to_string()];
        let files = scan_corpus(&config).unwrap();
        assert!(files.iter().all(|f| !f.relative.starts_with("tech/")));
    }

    #[test]
    fn test_missing_root() {
        let tmp = TempDir::new().unwrap();
        let err = scan_corpus(&corpus_config(&tmp.path().join("nope"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CorpusLoadError>(),
            Some(CorpusLoadError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_load_skips_malformed_records() {
        let tmp = setup();
        let analyzer = Analyzer::default();
        let (corpus, summary) =
            load_corpus(&corpus_config(tmp.path()), &analyzer, params()).unwrap();

        assert_eq!(corpus.len(), 2);
        assert!(corpus.article("a").is_some());
        // No id in the record: the origin becomes the id.
        let final_match = corpus.article("batch.json#0").unwrap();
        assert_eq!(final_match.category, "deportes");

        let skipped: Vec<&str> = summary.skipped.iter().map(|s| s.origin.as_str()).collect();
        assert_eq!(skipped, vec!["batch.json#1", "batch.json#2", "broken.json"]);
        assert_eq!(summary.skipped[0].reason, RecordError::MissingField("body".into()));
        assert_eq!(summary.skipped[1].reason, RecordError::NotAnObject);
        assert!(matches!(summary.skipped[2].reason, RecordError::InvalidJson(_)));
    }

    #[test]
    fn test_fingerprint_tracks_files_and_params() {
        let tmp = setup();
        let config = corpus_config(tmp.path());
        let files = scan_corpus(&config).unwrap();
        let base = fingerprint(&files, &params());
        assert_eq!(base.len(), 64);
        assert_eq!(base, fingerprint(&files, &params()));

        let other_params = VectorizerParams {
            ngram_max: 1,
            ..params()
        };
        assert_ne!(base, fingerprint(&files, &other_params));

        fs::write(
            tmp.path().join("tech/b.json"),
            r#"{"title":"t","body":"b","category":"c"}"#,
        )
        .unwrap();
        let files = scan_corpus(&config).unwrap();
        assert_ne!(base, fingerprint(&files, &params()));
    }
}
