//! Core data models shared by connection discovery and the taxonomy index.
//!
//! [`Strand`] is the read-only input to discovery. [`TaxonomyRow`] is the raw
//! shape a row source hands to the index builder: its taxonomy fields are
//! still JSON-encoded and are decoded at the edge by [`TaxonomyRow::decode`].

use serde::{Deserialize, Deserializer, Serialize};

/// A content record as seen by connection discovery.
///
/// Only `path` is required. Field aliases accept the camelCase names used
/// by the web app's JSON exports. Term lists accept `null` or a bare string,
/// and `null` content or relationships read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Strand {
    pub path: String,
    #[serde(default, deserialize_with = "lenient_terms")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_terms")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "lenient_terms")]
    pub subjects: Vec<String>,
    #[serde(default, alias = "loomSlug", skip_serializing_if = "Option::is_none")]
    pub loom_slug: Option<String>,
    #[serde(default, alias = "weaveSlug", skip_serializing_if = "Option::is_none")]
    pub weave_slug: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relationships: Relationships,
}

impl Strand {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = subjects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_loom(mut self, loom: impl Into<String>) -> Self {
        self.loom_slug = Some(loom.into());
        self
    }

    pub fn with_weave(mut self, weave: impl Into<String>) -> Self {
        self.weave_slug = Some(weave.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// The loom slug, if present and non-blank.
    pub fn loom(&self) -> Option<&str> {
        non_blank(self.loom_slug.as_deref())
    }

    /// The weave slug, if present and non-blank.
    pub fn weave(&self) -> Option<&str> {
        non_blank(self.weave_slug.as_deref())
    }
}

/// Explicit cross-references from one strand to others, by path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationships {
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default, alias = "seeAlso")]
    pub see_also: Vec<String>,
}

impl Relationships {
    pub fn is_empty(&self) -> bool {
        self.references.is_empty() && self.prerequisites.is_empty() && self.see_also.is_empty()
    }
}

/// One document row from a taxonomy source.
///
/// `subjects`, `topics` and `tags` hold JSON-encoded string arrays, or
/// `None` when the column is NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyRow {
    pub path: String,
    pub subjects: Option<String>,
    pub topics: Option<String>,
    pub tags: Option<String>,
}

impl TaxonomyRow {
    /// Build a row from already-decoded term lists, encoding them as the
    /// store would.
    pub fn from_terms(
        path: impl Into<String>,
        subjects: &[&str],
        topics: &[&str],
        tags: &[&str],
    ) -> Self {
        fn encode(terms: &[&str]) -> Option<String> {
            if terms.is_empty() {
                None
            } else {
                serde_json::to_string(terms).ok()
            }
        }
        Self {
            path: path.into(),
            subjects: encode(subjects),
            topics: encode(topics),
            tags: encode(tags),
        }
    }

    /// Decode one field. Each field is decoded independently so a single
    /// malformed column does not take the rest of the row with it.
    pub fn decode(raw: Option<&str>) -> Result<Vec<String>, serde_json::Error> {
        match raw {
            None => Ok(Vec::new()),
            Some(s) => {
                let parsed: Option<Vec<String>> = serde_json::from_str(s)?;
                Ok(parsed.unwrap_or_default())
            }
        }
    }
}

/// Lowercase and trim a term. Returns `None` for blank input.
pub fn normalize_term(term: &str) -> Option<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// A term list as it appears in hand-edited or DB-exported JSON.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientTerms {
    List(Vec<Option<String>>),
    One(String),
}

fn lenient_terms<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LenientTerms>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(LenientTerms::One(term)) => vec![term],
        // null entries inside the list are dropped
        Some(LenientTerms::List(terms)) => terms.into_iter().flatten().collect(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}
