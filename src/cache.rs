//! On-disk corpus cache.
//!
//! Building the vocabulary and every article vector is the expensive part
//! of startup, so a built [`Corpus`] is written as JSON together with the
//! fingerprint of the sources it came from and the records the build
//! skipped. A later load reuses it only when the fingerprint still matches.
//! A cache that cannot be read, parsed, or that fails
//! [`Corpus::check_consistency`] is treated as a miss.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use news_report_core::{Corpus, SkippedRecord};

#[derive(Serialize)]
struct CacheFileRef<'a> {
    fingerprint: &'a str,
    corpus: &'a Corpus,
    skipped: &'a [SkippedRecord],
}

#[derive(Deserialize)]
struct CacheFile {
    fingerprint: String,
    corpus: Corpus,
    #[serde(default)]
    skipped: Vec<SkippedRecord>,
}

/// Return the cached corpus and its skipped records if the file exists,
/// matches `fingerprint`, and holds together.
pub fn read_cache(path: &Path, fingerprint: &str) -> Option<(Corpus, Vec<SkippedRecord>)> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no corpus cache");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read corpus cache; rebuilding");
            return None;
        }
    };

    let cached: CacheFile = match serde_json::from_slice(&bytes) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt corpus cache; rebuilding");
            return None;
        }
    };

    if cached.fingerprint != fingerprint {
        debug!(path = %path.display(), "corpus cache is stale");
        return None;
    }
    if let Err(e) = cached.corpus.check_consistency() {
        warn!(path = %path.display(), error = %e, "inconsistent corpus cache; rebuilding");
        return None;
    }
    Some((cached.corpus, cached.skipped))
}

/// Write `corpus` and the records skipped while building it to `path`
/// atomically (temp file, then rename).
pub fn write_cache(
    path: &Path,
    fingerprint: &str,
    corpus: &Corpus,
    skipped: &[SkippedRecord],
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
    }

    let tmp = path.with_extension("tmp");
    let json = serde_json::to_vec(&CacheFileRef {
        fingerprint,
        corpus,
        skipped,
    })
    .context("Failed to serialize corpus cache")?;
    std::fs::write(&tmp, json)
        .with_context(|| format!("Failed to write corpus cache: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move corpus cache into place: {}", path.display()))?;

    debug!(path = %path.display(), articles = corpus.len(), "wrote corpus cache");
    Ok(())
}
