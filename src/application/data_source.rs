// Data source trait - the one capability every transaction backend provides
use crate::domain::transaction::{TransactionQuery, TransactionRecord};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote store unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("Query rejected ({status}): {message}")]
    Query { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl SourceError {
    /// Timeouts, dropped connections and overloaded upstreams may succeed on
    /// a later attempt; rejected or unreadable queries will not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::Timeout(_) | SourceError::Transport(_) | SourceError::Unavailable { .. }
        )
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Largest page the backend will return for a single request
    fn max_page_size(&self) -> usize;

    /// Number of rows matching the predicate at this moment
    async fn count(&self, query: &TransactionQuery) -> Result<u64, SourceError>;

    /// One page of matching rows, newest first (`created_at` descending)
    async fn fetch_page(
        &self,
        query: &TransactionQuery,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, SourceError>;

    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> Result<(), SourceError> {
        self.count(&TransactionQuery::unbounded()).await.map(|_| ())
    }
}
