// Filter domain model - the active query scope of a dashboard session
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the default trailing window.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Builds a range, swapping the bounds if they arrive reversed so that
    /// `from <= to` always holds.
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        match (from, to) {
            (Some(f), Some(t)) if f > t => Self { from: Some(t), to: Some(f) },
            _ => Self { from, to },
        }
    }

    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Self {
        Self::new(Some(now - Duration::days(days)), Some(now))
    }

    /// Range covering whole calendar days, from the start of `from` to the
    /// last instant of `to`.
    pub fn from_days(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self::new(from.map(start_of_day), to.map(end_of_day))
    }

    /// Compares two ranges at calendar-day precision.
    pub fn same_days(&self, other: &DateRange) -> bool {
        self.from.map(|d| d.date_naive()) == other.from.map(|d| d.date_naive())
            && self.to.map(|d| d.date_naive()) == other.to.map(|d| d.date_naive())
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.is_none_or(|f| instant >= f) && self.to.is_none_or(|t| instant <= t)
    }
}

pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    day.and_time(last).and_utc()
}

/// The multi-select dimensions of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionCategory {
    Regions,
    Brands,
    Categories,
    Stores,
    AgeGroups,
    Genders,
}

impl SelectionCategory {
    pub const ALL: [SelectionCategory; 6] = [
        SelectionCategory::Regions,
        SelectionCategory::Brands,
        SelectionCategory::Categories,
        SelectionCategory::Stores,
        SelectionCategory::AgeGroups,
        SelectionCategory::Genders,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickFilter {
    TopPerformers,
    NewProducts,
    Trending,
}

impl QuickFilter {
    pub const ALL: [QuickFilter; 3] = [
        QuickFilter::TopPerformers,
        QuickFilter::NewProducts,
        QuickFilter::Trending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuickFilter::TopPerformers => "topPerformers",
            QuickFilter::NewProducts => "newProducts",
            QuickFilter::Trending => "trending",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuickFilters {
    pub top_performers: bool,
    pub new_products: bool,
    pub trending: bool,
}

impl QuickFilters {
    pub fn get(&self, key: QuickFilter) -> bool {
        match key {
            QuickFilter::TopPerformers => self.top_performers,
            QuickFilter::NewProducts => self.new_products,
            QuickFilter::Trending => self.trending,
        }
    }

    pub fn set(&mut self, key: QuickFilter, enabled: bool) {
        match key {
            QuickFilter::TopPerformers => self.top_performers = enabled,
            QuickFilter::NewProducts => self.new_products = enabled,
            QuickFilter::Trending => self.trending = enabled,
        }
    }

    pub fn active(&self) -> impl Iterator<Item = QuickFilter> + '_ {
        QuickFilter::ALL.into_iter().filter(|q| self.get(*q))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub date_range: DateRange,
    pub selected_regions: Vec<String>,
    pub selected_brands: Vec<String>,
    pub selected_categories: Vec<String>,
    pub selected_stores: Vec<String>,
    pub selected_age_groups: Vec<String>,
    pub selected_genders: Vec<String>,
    pub search_term: String,
    pub quick_filters: QuickFilters,
}

impl FilterState {
    /// Default scope: trailing 30 days ending at `now`, nothing selected.
    pub fn with_defaults(now: DateTime<Utc>) -> Self {
        Self {
            date_range: DateRange::trailing_days(now, DEFAULT_WINDOW_DAYS),
            ..Self::default()
        }
    }

    pub fn selection(&self, category: SelectionCategory) -> &[String] {
        match category {
            SelectionCategory::Regions => &self.selected_regions,
            SelectionCategory::Brands => &self.selected_brands,
            SelectionCategory::Categories => &self.selected_categories,
            SelectionCategory::Stores => &self.selected_stores,
            SelectionCategory::AgeGroups => &self.selected_age_groups,
            SelectionCategory::Genders => &self.selected_genders,
        }
    }

    pub fn selection_mut(&mut self, category: SelectionCategory) -> &mut Vec<String> {
        match category {
            SelectionCategory::Regions => &mut self.selected_regions,
            SelectionCategory::Brands => &mut self.selected_brands,
            SelectionCategory::Categories => &mut self.selected_categories,
            SelectionCategory::Stores => &mut self.selected_stores,
            SelectionCategory::AgeGroups => &mut self.selected_age_groups,
            SelectionCategory::Genders => &mut self.selected_genders,
        }
    }

    /// Re-establishes what `apply` guarantees: ordered date bounds and
    /// duplicate-free selections.
    pub fn normalize(&mut self) {
        self.date_range = DateRange::new(self.date_range.from, self.date_range.to);
        for category in SelectionCategory::ALL {
            let values = std::mem::take(self.selection_mut(category));
            *self.selection_mut(category) = dedup(values);
        }
    }

    /// Applies a single top-level replacement. Selection lists are
    /// deduplicated, keeping first occurrence order.
    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::DateRange(range) => self.date_range = DateRange::new(range.from, range.to),
            FilterUpdate::Selection(category, values) => {
                *self.selection_mut(category) = dedup(values);
            }
            FilterUpdate::SearchTerm(term) => self.search_term = term,
            FilterUpdate::QuickFilters(flags) => self.quick_filters = flags,
        }
    }
}

/// Replacement value for one top-level field of a [`FilterState`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterUpdate {
    DateRange(DateRange),
    Selection(SelectionCategory, Vec<String>),
    SearchTerm(String),
    QuickFilters(QuickFilters),
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reversed_range_is_swapped() {
        let a = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let range = DateRange::new(Some(a), Some(b));
        assert_eq!(range.from, Some(b));
        assert_eq!(range.to, Some(a));
    }

    #[test]
    fn test_default_window() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let state = FilterState::with_defaults(now);
        assert_eq!(state.date_range.to, Some(now));
        assert_eq!(
            state.date_range.from.map(|d| d.date_naive()),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert!(state.selected_regions.is_empty());
    }

    #[test]
    fn test_apply_selection_dedups() {
        let mut state = FilterState::default();
        state.apply(FilterUpdate::Selection(
            SelectionCategory::Brands,
            vec!["Alaska".into(), "Oishi".into(), "Alaska".into()],
        ));
        assert_eq!(state.selected_brands, vec!["Alaska", "Oishi"]);
    }

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let range = DateRange::from_days(Some(day), Some(day));
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap()));
    }
}
