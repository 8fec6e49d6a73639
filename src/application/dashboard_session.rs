// Dashboard session - refetches on filter changes, the newest refresh wins
use crate::application::analytics_service::{AnalyticsError, AnalyticsService};
use crate::application::filter_store::{FilterStorage, FilterStore, NavigationPort};
use crate::application::supersession::{Supersession, Ticket};
use crate::domain::filters::FilterState;
use crate::domain::metrics::DashboardMetrics;
use std::sync::Arc;

/// Owns one session's filters and starts a refresh for every change.
pub struct DashboardSession<N: NavigationPort, S: FilterStorage> {
    store: FilterStore<N, S>,
    service: AnalyticsService,
    gate: Arc<Supersession>,
}

/// A refresh bound to one filter snapshot. It does not borrow the session,
/// so several can be in flight while the filters keep changing.
pub struct PendingRefresh {
    ticket: Ticket,
    filters: FilterState,
    service: AnalyticsService,
    gate: Arc<Supersession>,
}

impl PendingRefresh {
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// `None` when a later refresh started before this one finished.
    pub async fn run(self) -> Option<Result<DashboardMetrics, AnalyticsError>> {
        let result = self.service.dashboard_metrics(&self.filters).await;
        self.gate.accept(self.ticket, result)
    }
}

impl<N: NavigationPort, S: FilterStorage> DashboardSession<N, S> {
    pub fn new(store: FilterStore<N, S>, service: AnalyticsService) -> Self {
        Self {
            store,
            service,
            gate: Arc::new(Supersession::new()),
        }
    }

    pub fn store(&self) -> &FilterStore<N, S> {
        &self.store
    }

    pub fn hydrate(&mut self) -> PendingRefresh {
        self.store.hydrate();
        self.refresh()
    }

    /// Applies a filter mutation and starts the matching refresh.
    pub fn update(&mut self, change: impl FnOnce(&mut FilterStore<N, S>)) -> PendingRefresh {
        change(&mut self.store);
        self.refresh()
    }

    pub fn handle_navigation(&mut self) -> PendingRefresh {
        self.store.handle_navigation();
        self.refresh()
    }

    pub fn refresh(&self) -> PendingRefresh {
        PendingRefresh {
            ticket: self.gate.begin(),
            filters: self.store.state().clone(),
            service: self.service.clone(),
            gate: self.gate.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::aggregator::Aggregator;
    use crate::application::batched_fetcher::tests::synthetic_row;
    use crate::application::batched_fetcher::{BatchedFetcher, DEFAULT_REQUEST_TIMEOUT};
    use crate::application::data_source::{DataSource, SourceError};
    use crate::application::retry::RetryPolicy;
    use crate::domain::filters::SelectionCategory;
    use crate::domain::transaction::{TransactionQuery, TransactionRecord};
    use crate::infrastructure::navigation::MemoryHistory;
    use crate::infrastructure::storage::MemoryStorage;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::time::Duration;

    /// Answers region-scoped queries at once and everything else slowly.
    struct SlowUnscopedSource;

    impl SlowUnscopedSource {
        async fn total(query: &TransactionQuery) -> u64 {
            if query.store_locations.is_empty() {
                tokio::time::sleep(Duration::from_secs(5)).await;
                3
            } else {
                1
            }
        }
    }

    #[async_trait]
    impl DataSource for SlowUnscopedSource {
        fn name(&self) -> &'static str {
            "slow-unscoped"
        }

        fn max_page_size(&self) -> usize {
            1000
        }

        async fn count(&self, query: &TransactionQuery) -> Result<u64, SourceError> {
            Ok(Self::total(query).await)
        }

        async fn fetch_page(
            &self,
            query: &TransactionQuery,
            offset: u64,
            _limit: usize,
        ) -> Result<Vec<TransactionRecord>, SourceError> {
            let total = Self::total(query).await;
            Ok((offset..total).map(synthetic_row).collect())
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap()
    }

    fn session() -> DashboardSession<MemoryHistory, MemoryStorage> {
        let service = AnalyticsService::new(
            BatchedFetcher::new(Arc::new(SlowUnscopedSource), 1000, DEFAULT_REQUEST_TIMEOUT),
            RetryPolicy::default(),
            Aggregator::default(),
        );
        let store = FilterStore::with_clock(MemoryHistory::new(""), MemoryStorage::default(), fixed_now);
        DashboardSession::new(store, service)
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_refresh_is_accepted() {
        let mut session = session();
        let metrics = session.hydrate().run().await.unwrap().unwrap();
        assert_eq!(metrics.transactions, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_refresh_is_discarded() {
        let mut session = session();

        let stale = session.refresh();
        let fresh = session.update(|store| store.add_to_set(SelectionCategory::Regions, "NCR"));
        assert_eq!(fresh.filters().selected_regions, vec!["NCR"]);

        let (stale, fresh) = tokio::join!(stale.run(), fresh.run());

        assert!(stale.is_none());
        assert_eq!(fresh.unwrap().unwrap().transactions, 1);
        assert!(session.store().navigation().current_query().contains("barangays=NCR"));
    }
}
