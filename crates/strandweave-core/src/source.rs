//! Row source abstraction for the taxonomy index.
//!
//! The [`TaxonomySource`] trait is the only thing the index builder needs
//! from a database: one round trip returning every document's raw taxonomy
//! columns. The SQLite implementation lives in the app crate;
//! [`InMemorySource`] serves tests and embedders.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::TaxonomyRow;

/// A store that can list the taxonomy columns of every document.
#[async_trait]
pub trait TaxonomySource: Send + Sync {
    /// Fetch `{path, subjects, topics, tags}` for all documents.
    async fn taxonomy_rows(&self) -> Result<Vec<TaxonomyRow>>;
}

/// In-memory [`TaxonomySource`] backed by a `Vec` behind an `RwLock`.
#[derive(Default)]
pub struct InMemorySource {
    rows: RwLock<Vec<TaxonomyRow>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<TaxonomyRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Insert a row, replacing any existing row with the same path.
    pub fn push(&self, row: TaxonomyRow) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow!("in-memory source lock poisoned"))?;
        match rows.iter_mut().find(|r| r.path == row.path) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TaxonomySource for InMemorySource {
    async fn taxonomy_rows(&self) -> Result<Vec<TaxonomyRow>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow!("in-memory source lock poisoned"))?;
        Ok(rows.clone())
    }
}
