//! SQLite-backed strand store.
//!
//! [`SqliteStrandStore`] owns the `strands` table: upserts keyed by path,
//! bulk loads for connection discovery, and the [`TaxonomySource`] rows the
//! taxonomy index is built from.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use strandweave_core::models::{Relationships, Strand, TaxonomyRow};
use strandweave_core::source::TaxonomySource;

use crate::models::{StrandRecord, UpsertOutcome};

pub struct SqliteStrandStore {
    pool: SqlitePool,
}

impl SqliteStrandStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert or update a strand by path. Records whose content hash matches
    /// the stored row are left alone.
    pub async fn upsert_strand(&self, record: &StrandRecord) -> Result<UpsertOutcome> {
        let content_hash = content_hash(record)?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT content_hash FROM strands WHERE path = ?")
                .bind(record.path())
                .fetch_optional(&self.pool)
                .await?;

        let outcome = match existing {
            Some(ref h) if *h == content_hash => return Ok(UpsertOutcome::Unchanged),
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        };

        let strand = &record.strand;
        let relationships_json = serde_json::to_string(&strand.relationships)?;

        sqlx::query(
            r#"
            INSERT INTO strands (path, title, fabric_slug, weave_slug, loom_slug, content,
                                 subjects, topics, tags, relationships_json, content_hash, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(path) DO UPDATE SET
                title = excluded.title,
                fabric_slug = excluded.fabric_slug,
                weave_slug = excluded.weave_slug,
                loom_slug = excluded.loom_slug,
                content = excluded.content,
                subjects = excluded.subjects,
                topics = excluded.topics,
                tags = excluded.tags,
                relationships_json = excluded.relationships_json,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&strand.path)
        .bind(&record.title)
        .bind(&record.fabric_slug)
        .bind(&strand.weave_slug)
        .bind(&strand.loom_slug)
        .bind(&strand.content)
        .bind(encode_terms(&strand.subjects)?)
        .bind(encode_terms(&strand.topics)?)
        .bind(encode_terms(&strand.tags)?)
        .bind(&relationships_json)
        .bind(&content_hash)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(outcome)
    }

    /// All stored strands, ordered by path.
    pub async fn load_records(&self) -> Result<Vec<StrandRecord>> {
        let rows = sqlx::query(
            "SELECT path, title, fabric_slug, weave_slug, loom_slug, content, \
             subjects, topics, tags, relationships_json FROM strands ORDER BY path",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    pub async fn load_strands(&self) -> Result<Vec<Strand>> {
        Ok(self
            .load_records()
            .await?
            .into_iter()
            .map(|r| r.strand)
            .collect())
    }

    pub async fn get_strand(&self, path: &str) -> Result<Option<StrandRecord>> {
        let row = sqlx::query(
            "SELECT path, title, fabric_slug, weave_slug, loom_slug, content, \
             subjects, topics, tags, relationships_json FROM strands WHERE path = ?",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_record))
    }
}

#[async_trait]
impl TaxonomySource for SqliteStrandStore {
    async fn taxonomy_rows(&self) -> Result<Vec<TaxonomyRow>> {
        let rows = sqlx::query("SELECT path, subjects, topics, tags FROM strands ORDER BY path")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| TaxonomyRow {
                path: row.get("path"),
                subjects: row.get("subjects"),
                topics: row.get("topics"),
                tags: row.get("tags"),
            })
            .collect())
    }
}

fn content_hash(record: &StrandRecord) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(record)?);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Encode a term list for storage. Empty lists are stored as NULL.
fn encode_terms(terms: &[String]) -> Result<Option<String>> {
    if terms.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(terms)?))
    }
}

fn decode_terms(path: &str, field: &str, raw: Option<String>) -> Vec<String> {
    TaxonomyRow::decode(raw.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(path, field, error = %e, "stored taxonomy field is not a string array; ignoring");
        Vec::new()
    })
}

fn row_to_record(row: &SqliteRow) -> StrandRecord {
    let path: String = row.get("path");
    let relationships_json: String = row.get("relationships_json");
    let relationships: Relationships =
        serde_json::from_str(&relationships_json).unwrap_or_else(|e| {
            tracing::warn!(path = %path, error = %e, "stored relationships are malformed; ignoring");
            Relationships::default()
        });

    let strand = Strand {
        tags: decode_terms(&path, "tags", row.get("tags")),
        topics: decode_terms(&path, "topics", row.get("topics")),
        subjects: decode_terms(&path, "subjects", row.get("subjects")),
        loom_slug: row.get("loom_slug"),
        weave_slug: row.get("weave_slug"),
        content: row.get("content"),
        relationships,
        path,
    };

    StrandRecord {
        strand,
        title: row.get("title"),
        fabric_slug: row.get("fabric_slug"),
    }
}
