// Batched fetcher - drains a page-capped data source one page at a time
use crate::application::data_source::{DataSource, SourceError};
use crate::domain::transaction::{TransactionQuery, TransactionRecord};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct BatchedFetcher {
    source: Arc<dyn DataSource>,
    page_size: usize,
    request_timeout: Duration,
}

impl BatchedFetcher {
    pub fn new(source: Arc<dyn DataSource>, page_size: usize, request_timeout: Duration) -> Self {
        let page_size = page_size.clamp(1, source.max_page_size().max(1));
        Self {
            source,
            page_size,
            request_timeout,
        }
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Counts the matching rows, then requests `ceil(count / page_size)`
    /// pages in offset order. Any failed page fails the whole fetch.
    ///
    /// The count is a snapshot: rows written between the count and the last
    /// page can make the result longer or shorter than the count.
    pub async fn fetch_all(&self, query: &TransactionQuery) -> Result<Vec<TransactionRecord>, SourceError> {
        let total = self.with_timeout(self.source.count(query)).await?;
        if total == 0 {
            tracing::debug!(source = self.source.name(), "No transactions match the query");
            return Ok(Vec::new());
        }

        let page_size = self.page_size as u64;
        let batches = total.div_ceil(page_size);
        tracing::debug!(source = self.source.name(), total, batches, page_size, "Fetching transactions");

        // The count comes from the remote; never size an allocation by it alone.
        let mut rows = Vec::with_capacity(total.min(page_size) as usize);
        for batch in 0..batches {
            let offset = batch * page_size;
            let page = self
                .with_timeout(self.source.fetch_page(query, offset, self.page_size))
                .await
                .inspect_err(|e| {
                    tracing::warn!(batch = batch + 1, batches, offset, error = %e, "Batch failed");
                })?;
            tracing::trace!(batch = batch + 1, batches, rows = page.len(), "Batch complete");
            rows.extend(page);
        }

        if rows.len() as u64 != total {
            tracing::warn!(
                expected = total,
                fetched = rows.len(),
                "Row count changed between count and fetch"
            );
        }

        Ok(rows)
    }

    /// Round trip to the source, bounded by the request timeout.
    pub async fn ping(&self) -> Result<(), SourceError> {
        self.with_timeout(self.source.ping()).await
    }

    async fn with_timeout<T>(
        &self,
        request: impl Future<Output = Result<T, SourceError>>,
    ) -> Result<T, SourceError> {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.request_timeout)),
        }
    }
}
