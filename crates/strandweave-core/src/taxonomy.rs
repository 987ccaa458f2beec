//! Inverted index over subject, topic and tag metadata.
//!
//! A [`TaxonomyIndex`] maps each normalized term (lowercase, trimmed) to a
//! [`TermEntry`] listing the strands that carry it. The index is built in one
//! pass over the rows of a [`TaxonomySource`] and can then be updated
//! incrementally as single documents are added or edited.
//!
//! # Failure handling
//!
//! Building never fails. A row field that is not a JSON string array is
//! logged and skipped without affecting the row's other fields. A source
//! that fails to return rows at all is logged and yields an empty index.
//!
//! # Path multiplicity
//!
//! `strand_paths` holds each path at most once per term, and
//! `document_count` always equals its length. Re-indexing a document that is
//! already present, or listing a term twice in one row, never inflates
//! counts.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::{normalize_term, TaxonomyRow};
use crate::source::TaxonomySource;

/// One of the three taxonomy levels, from broadest to narrowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyLevel {
    Subject,
    Topic,
    Tag,
}

impl TaxonomyLevel {
    /// Lookup priority used by [`find_term_level`].
    pub const ALL: [TaxonomyLevel; 3] = [
        TaxonomyLevel::Subject,
        TaxonomyLevel::Topic,
        TaxonomyLevel::Tag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxonomyLevel::Subject => "subject",
            TaxonomyLevel::Topic => "topic",
            TaxonomyLevel::Tag => "tag",
        }
    }
}

impl fmt::Display for TaxonomyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxonomyLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "subject" | "subjects" => Ok(TaxonomyLevel::Subject),
            "topic" | "topics" => Ok(TaxonomyLevel::Topic),
            "tag" | "tags" => Ok(TaxonomyLevel::Tag),
            other => bail!(
                "Unknown taxonomy level: '{}'. Use subjects, topics, or tags.",
                other
            ),
        }
    }
}

/// Documents carrying a single normalized term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    pub term: String,
    pub document_count: usize,
    pub strand_paths: Vec<String>,
}

/// Result of [`find_term_level`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TermMatch<'a> {
    pub level: TaxonomyLevel,
    pub entry: &'a TermEntry,
}

/// The inverted index. Maps iterate in first-insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyIndex {
    pub subjects: IndexMap<String, TermEntry>,
    pub topics: IndexMap<String, TermEntry>,
    pub tags: IndexMap<String, TermEntry>,
    pub built_at: DateTime<Utc>,
}

impl TaxonomyIndex {
    /// An index with no terms, stamped with the current time.
    pub fn empty() -> Self {
        Self {
            subjects: IndexMap::new(),
            topics: IndexMap::new(),
            tags: IndexMap::new(),
            built_at: Utc::now(),
        }
    }

    pub fn level(&self, level: TaxonomyLevel) -> &IndexMap<String, TermEntry> {
        match level {
            TaxonomyLevel::Subject => &self.subjects,
            TaxonomyLevel::Topic => &self.topics,
            TaxonomyLevel::Tag => &self.tags,
        }
    }

    fn level_mut(&mut self, level: TaxonomyLevel) -> &mut IndexMap<String, TermEntry> {
        match level {
            TaxonomyLevel::Subject => &mut self.subjects,
            TaxonomyLevel::Topic => &mut self.topics,
            TaxonomyLevel::Tag => &mut self.tags,
        }
    }

    /// Total number of distinct terms across all levels.
    pub fn term_count(&self) -> usize {
        self.subjects.len() + self.topics.len() + self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.term_count() == 0
    }

    fn upsert<S: AsRef<str>>(&mut self, level: TaxonomyLevel, path: &str, terms: &[S]) {
        let map = self.level_mut(level);
        for raw in terms {
            let Some(term) = normalize_term(raw.as_ref()) else {
                continue;
            };
            let entry = map.entry(term.clone()).or_insert_with(|| TermEntry {
                term,
                document_count: 0,
                strand_paths: Vec::new(),
            });
            if !entry.strand_paths.iter().any(|p| p == path) {
                entry.strand_paths.push(path.to_string());
                entry.document_count = entry.strand_paths.len();
            }
        }
    }
}

/// Build an index from already-fetched rows.
///
/// Each row's `subjects`, `topics` and `tags` are decoded independently. A
/// field that fails to decode is logged and skipped for that row only.
pub fn build_index_from_rows(rows: &[TaxonomyRow]) -> TaxonomyIndex {
    let mut index = TaxonomyIndex::empty();
    let mut skipped_fields = 0usize;

    for row in rows {
        let fields = [
            (TaxonomyLevel::Subject, "subjects", row.subjects.as_deref()),
            (TaxonomyLevel::Topic, "topics", row.topics.as_deref()),
            (TaxonomyLevel::Tag, "tags", row.tags.as_deref()),
        ];
        for (level, field, raw) in fields {
            match TaxonomyRow::decode(raw) {
                Ok(terms) => index.upsert(level, &row.path, &terms),
                Err(e) => {
                    skipped_fields += 1;
                    tracing::warn!(path = %row.path, field, error = %e, "failed to parse taxonomy field; skipping");
                }
            }
        }
    }

    tracing::debug!(
        rows = rows.len(),
        subjects = index.subjects.len(),
        topics = index.topics.len(),
        tags = index.tags.len(),
        skipped_fields,
        "taxonomy index built"
    );

    index
}

/// Build an index from a row source.
///
/// With no source the result is an empty index. If the source fails, the
/// error is logged and an empty index is returned; this function never
/// surfaces an error to the caller.
pub async fn build_taxonomy_index(source: Option<&dyn TaxonomySource>) -> TaxonomyIndex {
    let Some(source) = source else {
        tracing::debug!("no taxonomy source available; returning empty index");
        return TaxonomyIndex::empty();
    };

    match source.taxonomy_rows().await {
        Ok(rows) => build_index_from_rows(&rows),
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch taxonomy rows; returning empty index");
            TaxonomyIndex::empty()
        }
    }
}

pub fn get_all_subjects(index: &TaxonomyIndex) -> Vec<String> {
    index.subjects.keys().cloned().collect()
}

pub fn get_all_topics(index: &TaxonomyIndex) -> Vec<String> {
    index.topics.keys().cloned().collect()
}

pub fn get_all_tags(index: &TaxonomyIndex) -> Vec<String> {
    index.tags.keys().cloned().collect()
}

/// Find the broadest level holding `term`: subjects, then topics, then tags.
pub fn find_term_level<'a>(index: &'a TaxonomyIndex, term: &str) -> Option<TermMatch<'a>> {
    let key = normalize_term(term)?;
    TaxonomyLevel::ALL.into_iter().find_map(|level| {
        index
            .level(level)
            .get(&key)
            .map(|entry| TermMatch { level, entry })
    })
}

/// Entries for `level`, most documents first, optionally truncated.
///
/// Equal counts keep insertion order.
pub fn get_terms_by_frequency(
    index: &TaxonomyIndex,
    level: TaxonomyLevel,
    limit: Option<usize>,
) -> Vec<&TermEntry> {
    let mut entries: Vec<&TermEntry> = index.level(level).values().collect();
    entries.sort_by(|a, b| b.document_count.cmp(&a.document_count));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

/// Add one document's terms to the index in place.
///
/// `built_at` is left untouched.
pub fn update_index_with_terms<S: AsRef<str>>(
    index: &mut TaxonomyIndex,
    path: &str,
    subjects: &[S],
    topics: &[S],
    tags: &[S],
) {
    index.upsert(TaxonomyLevel::Subject, path, subjects);
    index.upsert(TaxonomyLevel::Topic, path, topics);
    index.upsert(TaxonomyLevel::Tag, path, tags);
}

/// Remove a document from every entry. Entries left with no documents are
/// dropped. Returns `true` if anything changed.
pub fn remove_document(index: &mut TaxonomyIndex, path: &str) -> bool {
    let mut changed = false;
    for level in TaxonomyLevel::ALL {
        let map = index.level_mut(level);
        for entry in map.values_mut() {
            let before = entry.strand_paths.len();
            entry.strand_paths.retain(|p| p != path);
            if entry.strand_paths.len() != before {
                entry.document_count = entry.strand_paths.len();
                changed = true;
            }
        }
        map.retain(|_, entry| entry.document_count > 0);
    }
    changed
}

/// Replace a document's contribution with a new set of terms.
pub fn reindex_document<S: AsRef<str>>(
    index: &mut TaxonomyIndex,
    path: &str,
    subjects: &[S],
    topics: &[S],
    tags: &[S],
) {
    remove_document(index, path);
    update_index_with_terms(index, path, subjects, topics, tags);
}
