//! Swappable reference to the current corpus.
//!
//! Readers take a [`snapshot`](CorpusHandle::snapshot) (an `Arc` clone under
//! a short read lock) and keep using it for the whole request. A rebuild
//! constructs the new [`Corpus`] off to the side and then swaps the pointer
//! under the write lock, so no reader ever sees a half-built index.

use std::sync::{Arc, PoisonError, RwLock};

use super::Corpus;

/// Owner of the current corpus version.
pub struct CorpusHandle {
    current: RwLock<Arc<Corpus>>,
}

impl CorpusHandle {
    /// Install `corpus` as version 1.
    pub fn new(corpus: Corpus) -> Self {
        Self {
            current: RwLock::new(Arc::new(corpus.with_version(1))),
        }
    }

    /// The corpus in effect right now.
    pub fn snapshot(&self) -> Arc<Corpus> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version()
    }

    /// Swap in a fully built corpus, assigning it the next version number.
    ///
    /// Snapshots taken before the swap keep pointing at the old version.
    pub fn replace(&self, corpus: Corpus) -> Arc<Corpus> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(corpus.with_version(guard.version() + 1));
        *guard = Arc::clone(&next);
        next
    }
}
