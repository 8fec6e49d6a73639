// Fixture data source - serves a fixed row set from memory or a JSON file
use crate::application::data_source::{DataSource, SourceError};
use crate::domain::transaction::{TransactionQuery, TransactionRecord};
use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct FixtureSource {
    rows: Vec<TransactionRecord>,
    max_page_size: usize,
}

impl FixtureSource {
    pub fn new(mut rows: Vec<TransactionRecord>, max_page_size: usize) -> Self {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Self {
            rows,
            max_page_size: max_page_size.max(1),
        }
    }

    /// Loads a JSON array of transaction records.
    pub fn from_file(path: impl AsRef<Path>, max_page_size: usize) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let rows: Vec<TransactionRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))?;
        tracing::info!(rows = rows.len(), path = %path.display(), "Loaded transaction fixture");
        Ok(Self::new(rows, max_page_size))
    }

    fn matching<'a>(&'a self, query: &'a TransactionQuery) -> impl Iterator<Item = &'a TransactionRecord> + 'a {
        self.rows.iter().filter(move |r| query.matches(r))
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    async fn count(&self, query: &TransactionQuery) -> Result<u64, SourceError> {
        Ok(self.matching(query).count() as u64)
    }

    async fn fetch_page(
        &self,
        query: &TransactionQuery,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, SourceError> {
        Ok(self
            .matching(query)
            .skip(offset as usize)
            .take(limit.min(self.max_page_size))
            .cloned()
            .collect())
    }
}
