//! Strand records as stored in SQLite and exchanged in JSON.
//!
//! A [`StrandRecord`] is a core [`Strand`] plus the display metadata the
//! store keeps alongside it. Field names accept the camelCase spelling the
//! web app exports.

use serde::{Deserialize, Serialize};
use strandweave_core::models::Strand;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrandRecord {
    #[serde(flatten)]
    pub strand: Strand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "fabricSlug", skip_serializing_if = "Option::is_none")]
    pub fabric_slug: Option<String>,
}

impl StrandRecord {
    pub fn path(&self) -> &str {
        &self.strand.path
    }
}

impl From<Strand> for StrandRecord {
    fn from(strand: Strand) -> Self {
        Self {
            strand,
            title: None,
            fabric_slug: None,
        }
    }
}

/// What an upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_flattens_strand_fields() {
        let json = r#"{
            "path": "/weaves/frame/looms/core/intro.md",
            "title": "Intro",
            "fabricSlug": "garden",
            "weaveSlug": "frame",
            "tags": ["Intro"],
            "relationships": { "references": ["/weaves/frame/looms/core/next.md"] }
        }"#;
        let record: StrandRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.path(), "/weaves/frame/looms/core/intro.md");
        assert_eq!(record.title.as_deref(), Some("Intro"));
        assert_eq!(record.fabric_slug.as_deref(), Some("garden"));
        assert_eq!(record.strand.weave(), Some("frame"));
        assert_eq!(record.strand.relationships.references.len(), 1);
    }
}
