//! Caller-owned cache for a [`TaxonomyIndex`].
//!
//! The cache holds at most one index. It moves between two states:
//!
//! ```text
//! Uncached ──get_or_build──▶ Cached ──invalidate──▶ Uncached
//!                              │  ▲
//!                              └──┘ get_or_build(force_refresh = true)
//! ```
//!
//! There is no TTL or staleness detection; the owner decides when to
//! invalidate or force a refresh. Building takes `&mut self`, so two builds
//! can never race on one cache. Owners that share a cache across tasks wrap
//! it in their own lock.

use crate::source::TaxonomySource;
use crate::taxonomy::{build_taxonomy_index, TaxonomyIndex};

#[derive(Debug, Clone, Default)]
pub struct TaxonomyCache {
    index: Option<TaxonomyIndex>,
}

impl TaxonomyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached index, building it first if the cache is empty or
    /// `force_refresh` is set.
    pub async fn get_or_build(
        &mut self,
        source: Option<&dyn TaxonomySource>,
        force_refresh: bool,
    ) -> &mut TaxonomyIndex {
        if force_refresh || self.index.is_none() {
            let index = build_taxonomy_index(source).await;
            tracing::info!(
                terms = index.term_count(),
                force_refresh,
                "taxonomy index cached"
            );
            self.index = Some(index);
        }
        self.index.get_or_insert_with(TaxonomyIndex::empty)
    }

    /// Drop the cached index so the next [`get_or_build`](Self::get_or_build)
    /// rebuilds it.
    pub fn invalidate(&mut self) {
        if self.index.take().is_some() {
            tracing::debug!("taxonomy index invalidated");
        }
    }

    pub fn is_cached(&self) -> bool {
        self.index.is_some()
    }

    /// The cached index, without building.
    pub fn get(&self) -> Option<&TaxonomyIndex> {
        self.index.as_ref()
    }

    /// Mutable access for incremental updates, without building.
    pub fn get_mut(&mut self) -> Option<&mut TaxonomyIndex> {
        self.index.as_mut()
    }
}
