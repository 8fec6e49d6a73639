// Filter store - single owner of a session's FilterState
use crate::application::url_codec;
use crate::domain::filters::{FilterState, FilterUpdate, QuickFilter, SelectionCategory};
use chrono::{DateTime, Utc};

/// Key under which the serialized filter state is persisted.
pub const STORAGE_KEY: &str = "scout-filters";

/// Address-bar access. Writes replace the current history entry; they never
/// push a new one.
pub trait NavigationPort: Send {
    fn current_query(&self) -> String;

    fn replace_query(&mut self, query: &str);
}

/// Named blob storage that survives reloads.
pub trait FilterStorage: Send {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn save(&mut self, key: &str, blob: &str) -> anyhow::Result<()>;
}

pub struct FilterStore<N: NavigationPort, S: FilterStorage> {
    state: FilterState,
    defaults: FilterState,
    navigation: N,
    storage: S,
    clock: fn() -> DateTime<Utc>,
}

impl<N: NavigationPort, S: FilterStorage> FilterStore<N, S> {
    pub fn new(navigation: N, storage: S) -> Self {
        Self::with_clock(navigation, storage, Utc::now)
    }

    pub fn with_clock(navigation: N, storage: S, clock: fn() -> DateTime<Utc>) -> Self {
        let defaults = FilterState::with_defaults(clock());
        Self {
            state: defaults.clone(),
            defaults,
            navigation,
            storage,
            clock,
        }
    }

    /// Restores persisted state, then overlays whatever the current URL
    /// carries, then writes the merged result back once.
    pub fn hydrate(&mut self) {
        match self.storage.load(STORAGE_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<FilterState>(&blob) {
                Ok(mut restored) => {
                    restored.normalize();
                    self.state = restored;
                }
                Err(e) => tracing::warn!(error = %e, "Discarding unreadable persisted filters"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load persisted filters"),
        }

        url_codec::decode(&self.navigation.current_query()).apply_to(&mut self.state);
        self.commit();
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn navigation(&self) -> &N {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut N {
        &mut self.navigation
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn set_field(&mut self, update: FilterUpdate) {
        self.state.apply(update);
        self.commit();
    }

    pub fn set_quick_filter(&mut self, key: QuickFilter, enabled: bool) {
        if self.state.quick_filters.get(key) == enabled {
            return;
        }
        self.state.quick_filters.set(key, enabled);
        self.commit();
    }

    pub fn add_to_set(&mut self, category: SelectionCategory, value: &str) {
        let values = self.state.selection_mut(category);
        if values.iter().any(|v| v == value) {
            return;
        }
        values.push(value.to_string());
        self.commit();
    }

    pub fn remove_from_set(&mut self, category: SelectionCategory, value: &str) {
        let values = self.state.selection_mut(category);
        let before = values.len();
        values.retain(|v| v != value);
        if values.len() != before {
            self.commit();
        }
    }

    pub fn reset_category(&mut self, category: SelectionCategory) {
        self.state.selection_mut(category).clear();
        self.commit();
    }

    /// Back to a fresh trailing window with nothing selected.
    pub fn reset_all(&mut self) {
        self.defaults = FilterState::with_defaults((self.clock)());
        self.state = self.defaults.clone();
        self.commit();
    }

    /// Selected values across all categories, plus one each for a
    /// non-default date range, a search term and every enabled quick filter.
    pub fn active_filter_count(&self) -> usize {
        let selected: usize = SelectionCategory::ALL
            .iter()
            .map(|c| self.state.selection(*c).len())
            .sum();
        let date = usize::from(!self.state.date_range.same_days(&self.defaults.date_range));
        let search = usize::from(!self.state.search_term.is_empty());
        let quick = self.state.quick_filters.active().count();

        selected + date + search + quick
    }

    /// Back/forward landed on another entry: adopt its filters without
    /// writing the URL again.
    pub fn handle_navigation(&mut self) {
        let patch = url_codec::decode(&self.navigation.current_query());
        let mut next = self.defaults.clone();
        patch.apply_to(&mut next);
        self.state = next;
        self.persist();
    }

    fn commit(&mut self) {
        self.persist();
        let query = url_codec::encode(&self.state);
        self.navigation.replace_query(&query);
    }

    fn persist(&mut self) {
        let blob = match serde_json::to_string(&self.state) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize filters");
                return;
            }
        };
        if let Err(e) = self.storage.save(STORAGE_KEY, &blob) {
            tracing::warn!(error = %e, "Failed to persist filters");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filters::DateRange;
    use crate::infrastructure::navigation::MemoryHistory;
    use crate::infrastructure::storage::MemoryStorage;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap()
    }

    fn store_at(query: &str) -> FilterStore<MemoryHistory, MemoryStorage> {
        FilterStore::with_clock(MemoryHistory::new(query), MemoryStorage::default(), fixed_now)
    }

    #[test]
    fn test_default_state_has_no_active_filters() {
        let store = store_at("");
        assert_eq!(store.active_filter_count(), 0);
    }

    #[test]
    fn test_active_count_grows_per_dimension() {
        let mut store = store_at("");
        let mut last = store.active_filter_count();

        store.add_to_set(SelectionCategory::Regions, "NCR");
        assert!(store.active_filter_count() > last);
        last = store.active_filter_count();

        store.set_field(FilterUpdate::SearchTerm("rice".into()));
        assert!(store.active_filter_count() > last);
        last = store.active_filter_count();

        store.set_quick_filter(QuickFilter::Trending, true);
        assert!(store.active_filter_count() > last);
        last = store.active_filter_count();

        store.set_field(FilterUpdate::DateRange(DateRange::new(
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()),
        )));
        assert!(store.active_filter_count() > last);
        assert_eq!(store.active_filter_count(), 4);
    }

    #[test]
    fn test_add_to_set_is_idempotent() {
        let mut store = store_at("");
        store.add_to_set(SelectionCategory::Brands, "Alaska");
        store.add_to_set(SelectionCategory::Brands, "Alaska");
        assert_eq!(store.state().selected_brands, vec!["Alaska"]);
    }

    #[test]
    fn test_remove_absent_value_is_noop() {
        let mut store = store_at("");
        store.add_to_set(SelectionCategory::Stores, "Store 1");
        let before = store.state().clone();
        store.remove_from_set(SelectionCategory::Stores, "Store 9");
        assert_eq!(store.state(), &before);

        store.remove_from_set(SelectionCategory::Stores, "Store 1");
        assert!(store.state().selected_stores.is_empty());
    }

    #[test]
    fn test_mutations_replace_history_entry() {
        let mut store = store_at("");
        store.add_to_set(SelectionCategory::Regions, "NCR");
        store.add_to_set(SelectionCategory::Categories, "Beverages");

        let history = store.navigation();
        assert_eq!(history.len(), 1);
        assert!(history.current_query().contains("barangays=NCR"));
        assert!(history.current_query().contains("categories=Beverages"));
    }

    #[test]
    fn test_reset_category_and_reset_all() {
        let mut store = store_at("");
        store.add_to_set(SelectionCategory::Regions, "NCR");
        store.add_to_set(SelectionCategory::Genders, "Male");
        store.set_field(FilterUpdate::SearchTerm("soap".into()));

        store.reset_category(SelectionCategory::Regions);
        assert!(store.state().selected_regions.is_empty());
        assert_eq!(store.state().selected_genders, vec!["Male"]);

        store.reset_all();
        assert_eq!(store.state(), &FilterState::with_defaults(fixed_now()));
        assert_eq!(store.active_filter_count(), 0);
    }

    #[test]
    fn test_hydrate_prefers_url_over_storage() {
        let mut storage = MemoryStorage::default();
        let persisted = FilterState {
            selected_regions: vec!["Cebu".into()],
            selected_brands: vec!["Oishi".into()],
            ..FilterState::with_defaults(fixed_now())
        };
        storage
            .save(STORAGE_KEY, &serde_json::to_string(&persisted).unwrap())
            .unwrap();

        let mut store =
            FilterStore::with_clock(MemoryHistory::new("barangays=NCR"), storage, fixed_now);
        store.hydrate();

        assert_eq!(store.state().selected_regions, vec!["NCR"]);
        assert_eq!(store.state().selected_brands, vec!["Oishi"]);
    }

    #[test]
    fn test_hydrate_ignores_corrupt_blob() {
        let mut storage = MemoryStorage::default();
        storage.save(STORAGE_KEY, "{not json").unwrap();
        let mut store = FilterStore::with_clock(MemoryHistory::new(""), storage, fixed_now);
        store.hydrate();
        assert_eq!(store.active_filter_count(), 0);
    }

    #[test]
    fn test_hydrate_normalizes_restored_state() {
        let mut storage = MemoryStorage::default();
        let blob = r#"{
            "dateRange": {"from": "2024-06-30T00:00:00Z", "to": "2024-06-01T00:00:00Z"},
            "selectedBrands": ["Alaska", "Oishi", "Alaska"]
        }"#;
        storage.save(STORAGE_KEY, blob).unwrap();

        let mut store = FilterStore::with_clock(MemoryHistory::new(""), storage, fixed_now);
        store.hydrate();

        let state = store.state();
        assert_eq!(state.selected_brands, vec!["Alaska", "Oishi"]);
        assert!(state.date_range.from <= state.date_range.to);
        assert_eq!(store.active_filter_count(), 3);
    }

    #[test]
    fn test_mutations_are_persisted() {
        let mut store = store_at("");
        store.add_to_set(SelectionCategory::AgeGroups, "25-34");
        let blob = store.storage().load(STORAGE_KEY).unwrap().unwrap();
        let restored: FilterState = serde_json::from_str(&blob).unwrap();
        assert_eq!(restored.selected_age_groups, vec!["25-34"]);
    }

    #[test]
    fn test_back_navigation_reads_without_writing() {
        let mut store = store_at("");
        store.add_to_set(SelectionCategory::Regions, "NCR");

        store.navigation_mut().push("barangays=Cebu");
        store.handle_navigation();
        assert_eq!(store.state().selected_regions, vec!["Cebu"]);

        assert!(store.navigation_mut().back());
        store.handle_navigation();
        assert_eq!(store.state().selected_regions, vec!["NCR"]);
        assert_eq!(store.navigation().len(), 2);
        assert_eq!(store.navigation().current_query(), store_query_for_ncr());
    }

    fn store_query_for_ncr() -> String {
        let mut state = FilterState::with_defaults(fixed_now());
        state.selected_regions = vec!["NCR".into()];
        url_codec::encode(&state)
    }
}
