//! src/expander.rs
//!
//! Expands a base URL into the combinatorial set of candidate URLs
//! (wordlist x extensions) and inserts them into the Store in one batch,
//! relying on the Store's unique constraint to dedupe against already-known
//! URIs. Generalizes `StartUpdater`/`addURLs` in `original_source/
//! libgetgood/updater.go`.
//!
//! Ordering (spec.md §4.2): words in input order, extensions in input
//! order, empty extension first. The caller (`Config::parse_extensions`)
//! is responsible for that ordering invariant; `Expander` trusts it.

use std::sync::Arc;

use crate::store::{Store, StoreError};

/// Errors surfaced by `Expander::expand`. Currently a thin wrapper around
/// `StoreError` — expansion itself is pure string formatting and cannot
/// fail — but kept as its own type (rather than returning `StoreError`
/// directly) so the Collector's fatal-error taxonomy stays keyed by
/// originating component rather than by the Store's error type alone.
#[derive(Debug, thiserror::Error)]
pub enum ExpanderError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Builds candidate URLs from a base directory, the shared wordlist, and
/// the shared extension list, then inserts them into the Store.
pub struct Expander {
    store: Arc<Store>,
    words: Arc<Vec<String>>,
    extensions: Arc<Vec<String>>,
}

impl Expander {
    pub fn new(store: Arc<Store>, words: Arc<Vec<String>>, extensions: Arc<Vec<String>>) -> Self {
        Self {
            store,
            words,
            extensions,
        }
    }

    /// Expands `base` (normalized to end with `/`) into `words x extensions`
    /// candidate URLs and inserts them. Returns the number of URIs handed to
    /// the Store (not the number actually inserted — duplicates are a
    /// Store-level no-op per spec.md invariant 5).
    pub async fn expand(&self, base: &str) -> Result<usize, ExpanderError> {
        let base = normalize_trailing_slash(base);
        let mut candidates = Vec::with_capacity(self.words.len() * self.extensions.len().max(1));

        for word in self.words.iter() {
            for ext in self.extensions.iter() {
                candidates.push(format!("{base}{word}{ext}"));
            }
        }

        let count = candidates.len();
        self.store.add_requests(&candidates).await?;
        Ok(count)
    }
}

fn normalize_trailing_slash(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}
