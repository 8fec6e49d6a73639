// Analytics service - fetch with retry, then aggregate, per dashboard view
use crate::application::aggregator::Aggregator;
use crate::application::batched_fetcher::BatchedFetcher;
use crate::application::data_source::SourceError;
use crate::application::retry::RetryPolicy;
use crate::domain::filters::FilterState;
use crate::domain::metrics::{
    ConsumerInsights, DashboardMetrics, FilterOptions, ProductMix, RegionInsights, TransactionTrends,
};
use crate::domain::transaction::{TransactionQuery, TransactionRecord};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Transient failures outlasted the retry policy
    #[error("Data source unavailable after {attempts} attempts: {source}")]
    Unavailable { attempts: u32, source: SourceError },

    /// The store rejected the query or answered with something unreadable
    #[error("Data source query failed: {0}")]
    Query(#[source] SourceError),
}

#[derive(Clone)]
pub struct AnalyticsService {
    fetcher: BatchedFetcher,
    retry: RetryPolicy,
    aggregator: Aggregator,
}

impl AnalyticsService {
    pub fn new(fetcher: BatchedFetcher, retry: RetryPolicy, aggregator: Aggregator) -> Self {
        Self {
            fetcher,
            retry,
            aggregator,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.fetcher.source().name()
    }

    pub async fn health(&self) -> Result<(), SourceError> {
        self.fetcher.ping().await
    }

    /// Whole-fetch retry: a transient failure on any page restarts the
    /// fetch from the count.
    async fn fetch_rows(&self, query: &TransactionQuery) -> Result<Vec<TransactionRecord>, AnalyticsError> {
        let started = Instant::now();
        let rows = self
            .retry
            .run(
                "fetch_transactions",
                || self.fetcher.fetch_all(query),
                SourceError::is_transient,
            )
            .await
            .map_err(|e| {
                if e.is_transient() {
                    AnalyticsError::Unavailable {
                        attempts: self.retry.max_attempts,
                        source: e,
                    }
                } else {
                    AnalyticsError::Query(e)
                }
            })?;

        tracing::info!(
            source = self.source_name(),
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched transactions"
        );
        Ok(rows)
    }

    pub async fn dashboard_metrics(&self, filters: &FilterState) -> Result<DashboardMetrics, AnalyticsError> {
        let rows = self.fetch_rows(&TransactionQuery::from_filters(filters)).await?;
        Ok(self.aggregator.dashboard_metrics(&rows, filters))
    }

    pub async fn transaction_trends(&self, filters: &FilterState) -> Result<TransactionTrends, AnalyticsError> {
        let rows = self.fetch_rows(&TransactionQuery::from_filters(filters)).await?;
        Ok(self.aggregator.transaction_trends(&rows, filters))
    }

    pub async fn consumer_insights(&self, filters: &FilterState) -> Result<ConsumerInsights, AnalyticsError> {
        let rows = self.fetch_rows(&TransactionQuery::from_filters(filters)).await?;
        Ok(self.aggregator.consumer_insights(&rows, filters))
    }

    pub async fn product_mix(&self, filters: &FilterState) -> Result<ProductMix, AnalyticsError> {
        let rows = self.fetch_rows(&TransactionQuery::from_filters(filters)).await?;
        Ok(self.aggregator.product_mix(&rows, filters))
    }

    pub async fn region_insights(&self, filters: &FilterState) -> Result<RegionInsights, AnalyticsError> {
        let rows = self.fetch_rows(&TransactionQuery::from_filters(filters)).await?;
        Ok(self.aggregator.region_insights(&rows, filters))
    }

    /// Options are drawn from every transaction, regardless of the active
    /// filters.
    pub async fn filter_options(&self) -> Result<FilterOptions, AnalyticsError> {
        let rows = self.fetch_rows(&TransactionQuery::unbounded()).await?;
        Ok(self.aggregator.filter_options(&rows))
    }
}
