// Aggregator - pure reductions from a fetched row set to dashboard metrics
use crate::domain::filters::FilterState;
use crate::domain::metrics::{
    ChartPoint, ConsumerInsights, DashboardMetrics, FilterOption, FilterOptions, HeatmapCell,
    MarketShare, NamedValue, ProductMix, RegionInsights, RegionSummary, ShareEntry,
    TransactionTrends,
};
use crate::domain::transaction::TransactionRecord;
use chrono::{Datelike, Days, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

const TOP_LOCATIONS: usize = 8;

/// Longest daily series a single response carries.
pub const DEFAULT_MAX_SERIES_DAYS: usize = 366;
const UNKNOWN: &str = "Unknown";
const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub const AGE_GROUPS: [&str; 5] = ["18-24", "25-34", "35-44", "45-54", "55+"];
pub const GENDERS: [&str; 2] = ["Male", "Female"];

/// Basket-value buckets: upper bounds are inclusive, the last bucket is
/// open-ended. An amount belongs to the first bucket whose bound it does not
/// exceed.
pub const VALUE_BUCKETS: [(&str, Option<f64>); 5] = [
    ("0-500", Some(500.0)),
    ("501-1000", Some(1000.0)),
    ("1001-2000", Some(2000.0)),
    ("2001-5000", Some(5000.0)),
    ("5000+", None),
];

/// Shopping-time slots as `[start_hour, end_hour)`; the last one wraps
/// midnight and takes every remaining hour.
const TIME_SLOTS: [(&str, u32, u32); 6] = [
    ("6-9 AM", 6, 9),
    ("9 AM-12 PM", 9, 12),
    ("12-3 PM", 12, 15),
    ("3-6 PM", 15, 18),
    ("6-9 PM", 18, 21),
    ("9 PM-6 AM", 21, 6),
];

/// Trend percentage as the clamped distance of a metric from a fixed
/// reference level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendRule {
    pub baseline: f64,
    pub scale: f64,
    pub min: f64,
    pub max: f64,
}

impl TrendRule {
    pub fn percent(&self, value: f64) -> f64 {
        ((value - self.baseline) / self.scale).clamp(self.min, self.max)
    }
}

pub const REVENUE_TREND: TrendRule = TrendRule { baseline: 150.0, scale: 10.0, min: -20.0, max: 30.0 };
pub const TRANSACTIONS_TREND: TrendRule = TrendRule { baseline: 1000.0, scale: 100.0, min: -15.0, max: 25.0 };
pub const BASKET_TREND: TrendRule = TrendRule { baseline: 100.0, scale: 20.0, min: -10.0, max: 20.0 };
pub const CUSTOMERS_TREND: TrendRule = TrendRule { baseline: 500.0, scale: 50.0, min: -12.0, max: 18.0 };

pub fn age_group(age: u32) -> Option<&'static str> {
    match age {
        18..=24 => Some(AGE_GROUPS[0]),
        25..=34 => Some(AGE_GROUPS[1]),
        35..=44 => Some(AGE_GROUPS[2]),
        45..=54 => Some(AGE_GROUPS[3]),
        55..=u32::MAX => Some(AGE_GROUPS[4]),
        _ => None,
    }
}

pub fn gender_label(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "m" | "male" => Some(GENDERS[0]),
        "f" | "female" => Some(GENDERS[1]),
        _ => None,
    }
}

/// Filters the predicate could not express: stores, brands, categories,
/// age groups, genders and free-text search. Regions were pushed down to
/// the data source.
pub fn apply_client_filters<'a>(
    rows: &'a [TransactionRecord],
    filters: &FilterState,
) -> Vec<&'a TransactionRecord> {
    let search = filters.search_term.trim().to_lowercase();
    rows.iter()
        .filter(|r| {
            filters.selected_stores.is_empty()
                || r.store_location.as_ref().is_some_and(|l| filters.selected_stores.contains(l))
        })
        .filter(|r| {
            filters.selected_brands.is_empty()
                || r.brands().any(|b| filters.selected_brands.iter().any(|s| s == b))
        })
        .filter(|r| {
            filters.selected_categories.is_empty()
                || r.categories().any(|c| filters.selected_categories.iter().any(|s| s == c))
        })
        .filter(|r| {
            filters.selected_age_groups.is_empty()
                || r.customer_age
                    .and_then(age_group)
                    .is_some_and(|g| filters.selected_age_groups.iter().any(|s| s == g))
        })
        .filter(|r| {
            filters.selected_genders.is_empty()
                || r.customer_gender.as_deref().is_some_and(|g| {
                    let label = gender_label(g);
                    filters.selected_genders.iter().any(|s| s == g || Some(s.as_str()) == label)
                })
        })
        .filter(|r| search.is_empty() || matches_search(r, &search))
        .collect()
}

fn matches_search(record: &TransactionRecord, needle: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);
    hit(&record.id)
        || record.store_location.as_deref().is_some_and(hit)
        || record.payment_method.as_deref().is_some_and(hit)
        || record.items.iter().any(|i| {
            hit(&i.product_name)
                || i.brand.as_deref().is_some_and(hit)
                || i.category.as_deref().is_some_and(hit)
        })
}

pub fn total_revenue(rows: &[&TransactionRecord]) -> f64 {
    rows.iter().map(|r| r.total_amount).sum()
}

/// Zero when there are no transactions.
pub fn average_basket(revenue: f64, transactions: usize) -> f64 {
    if transactions == 0 {
        0.0
    } else {
        revenue / transactions as f64
    }
}

/// There is no customer identifier in the data, so distinct
/// (age, gender, location) tuples stand in for customers. Different
/// shoppers sharing a tuple collapse into one.
pub fn estimate_customers(rows: &[&TransactionRecord]) -> usize {
    rows.iter()
        .map(|r| (r.customer_age, r.customer_gender.as_deref(), r.store_location.as_deref()))
        .collect::<HashSet<_>>()
        .len()
}

fn percent_of(count: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((count as f64 / total as f64) * 100.0).round() as u32
    }
}

fn share_of(value: f64, total: f64) -> f64 {
    if total > 0.0 { value / total * 100.0 } else { 0.0 }
}

fn sorted_desc(map: HashMap<String, f64>) -> Vec<NamedValue> {
    let mut out: Vec<NamedValue> = map
        .into_iter()
        .map(|(name, value)| NamedValue { name, value })
        .collect();
    out.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    out
}

fn market_shares(map: HashMap<String, f64>) -> Vec<MarketShare> {
    let total: f64 = map.values().sum();
    sorted_desc(map)
        .into_iter()
        .map(|n| MarketShare {
            market_share: share_of(n.value, total),
            name: n.name,
            value: n.value,
        })
        .collect()
}

fn counted_desc(map: HashMap<String, usize>) -> Vec<FilterOption> {
    let mut out: Vec<FilterOption> = map
        .into_iter()
        .map(|(value, count)| FilterOption { value, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out
}

/// Reductions that bucket by calendar day or hour use the market's local
/// time, a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    offset: FixedOffset,
    max_series_days: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        // Philippine time
        Self::with_offset_hours(8).unwrap_or_else(|| Self::new(Utc.fix()))
    }
}

impl Aggregator {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            max_series_days: DEFAULT_MAX_SERIES_DAYS,
        }
    }

    /// Caps daily series at the most recent `days` days of the window.
    pub fn with_max_series_days(self, days: usize) -> Self {
        Self {
            max_series_days: days.max(1),
            ..self
        }
    }

    pub fn with_offset_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours * 3600).map(Self::new)
    }

    fn local_day(&self, record: &TransactionRecord) -> NaiveDate {
        record.created_at.with_timezone(&self.offset).date_naive()
    }

    /// One point per local day of the filter's range (or of the data when
    /// the range is open), zero-filled. Windows longer than the series cap
    /// keep their most recent days.
    fn daily_series(
        &self,
        rows: &[&TransactionRecord],
        filters: &FilterState,
        value: impl Fn(&TransactionRecord) -> f64,
    ) -> Vec<ChartPoint> {
        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for r in rows {
            *by_day.entry(self.local_day(r)).or_default() += value(*r);
        }

        let range = &filters.date_range;
        let first = range
            .from
            .map(|d| d.with_timezone(&self.offset).date_naive())
            .or_else(|| by_day.keys().next().copied());
        let last = range
            .to
            .map(|d| d.with_timezone(&self.offset).date_naive())
            .or_else(|| by_day.keys().next_back().copied());
        let (Some(first), Some(last)) = (first, last) else {
            return Vec::new();
        };

        let span = Days::new(self.max_series_days.saturating_sub(1) as u64);
        let first = match last.checked_sub_days(span) {
            Some(earliest) if earliest > first => earliest,
            _ => first,
        };

        let mut series = Vec::new();
        let mut day = Some(first);
        while let Some(current) = day.filter(|d| *d <= last) {
            series.push(ChartPoint::new(
                current.format("%Y-%m-%d").to_string(),
                by_day.get(&current).copied().unwrap_or(0.0),
            ));
            day = current.checked_add_days(Days::new(1));
        }
        series
    }

    pub fn dashboard_metrics(&self, rows: &[TransactionRecord], filters: &FilterState) -> DashboardMetrics {
        let rows = apply_client_filters(rows, filters);
        let revenue = total_revenue(&rows);
        let transactions = rows.len();
        let avg_basket_size = average_basket(revenue, transactions);
        let active_customers = estimate_customers(&rows);

        let mut by_location: HashMap<String, f64> = HashMap::new();
        for r in &rows {
            let name = r.store_location.clone().unwrap_or_else(|| UNKNOWN.to_string());
            *by_location.entry(name).or_default() += r.total_amount;
        }
        let mut top_locations = sorted_desc(by_location);
        top_locations.truncate(TOP_LOCATIONS);

        DashboardMetrics {
            revenue,
            transactions,
            avg_basket_size,
            active_customers,
            revenue_trend: REVENUE_TREND.percent(avg_basket_size),
            transactions_trend: TRANSACTIONS_TREND.percent(transactions as f64),
            basket_trend: BASKET_TREND.percent(avg_basket_size),
            customers_trend: CUSTOMERS_TREND.percent(active_customers as f64),
            revenue_trend_data: self.daily_series(&rows, filters, |r| r.total_amount),
            top_locations,
        }
    }

    pub fn transaction_trends(&self, rows: &[TransactionRecord], filters: &FilterState) -> TransactionTrends {
        let rows = apply_client_filters(rows, filters);

        let mut buckets = [0usize; VALUE_BUCKETS.len()];
        for r in &rows {
            let idx = VALUE_BUCKETS
                .iter()
                .position(|(_, upper)| upper.is_none_or(|u| r.total_amount <= u))
                .unwrap_or(VALUE_BUCKETS.len() - 1);
            buckets[idx] += 1;
        }
        let value_distribution = VALUE_BUCKETS
            .iter()
            .zip(buckets)
            .map(|((label, _), count)| ChartPoint::new(label.to_string(), count as f64))
            .collect();

        let mut grid = [[0usize; 24]; 7];
        for r in &rows {
            let local = r.created_at.with_timezone(&self.offset);
            grid[local.weekday().num_days_from_sunday() as usize][local.hour() as usize] += 1;
        }
        let hourly_heatmap = grid
            .iter()
            .enumerate()
            .flat_map(|(day, hours)| {
                hours.iter().enumerate().map(move |(hour, value)| HeatmapCell {
                    day: DAY_NAMES[day],
                    hour: hour as u32,
                    value: *value,
                })
            })
            .collect();

        TransactionTrends {
            daily_volume: self.daily_series(&rows, filters, |_| 1.0),
            value_distribution,
            hourly_heatmap,
        }
    }

    pub fn consumer_insights(&self, rows: &[TransactionRecord], filters: &FilterState) -> ConsumerInsights {
        let rows = apply_client_filters(rows, filters);
        let total = rows.len();

        let mut ages = [0usize; AGE_GROUPS.len()];
        let mut genders = [0usize; GENDERS.len()];
        let mut slots = [0usize; TIME_SLOTS.len()];
        for r in &rows {
            if let Some(group) = r.customer_age.and_then(age_group) {
                if let Some(i) = AGE_GROUPS.iter().position(|g| *g == group) {
                    ages[i] += 1;
                }
            }
            if let Some(label) = r.customer_gender.as_deref().and_then(gender_label) {
                if let Some(i) = GENDERS.iter().position(|g| *g == label) {
                    genders[i] += 1;
                }
            }
            let hour = r.created_at.with_timezone(&self.offset).hour();
            let slot = TIME_SLOTS
                .iter()
                .position(|(_, start, end)| hour >= *start && hour < *end)
                .unwrap_or(TIME_SLOTS.len() - 1);
            slots[slot] += 1;
        }

        let shares = |labels: &[&str], counts: &[usize]| -> Vec<ShareEntry> {
            labels
                .iter()
                .zip(counts)
                .filter(|(_, count)| **count > 0)
                .map(|(name, count)| ShareEntry {
                    name: name.to_string(),
                    value: percent_of(*count, total),
                    count: *count,
                })
                .collect()
        };
        let slot_labels: Vec<&str> = TIME_SLOTS.iter().map(|(label, _, _)| *label).collect();

        ConsumerInsights {
            age_distribution: shares(&AGE_GROUPS, &ages),
            gender_distribution: shares(&GENDERS, &genders),
            shopping_times: shares(&slot_labels, &slots),
        }
    }

    pub fn product_mix(&self, rows: &[TransactionRecord], filters: &FilterState) -> ProductMix {
        let rows = apply_client_filters(rows, filters);

        let mut locations: HashMap<String, f64> = HashMap::new();
        let mut payments: HashMap<String, f64> = HashMap::new();
        let mut categories: HashMap<String, f64> = HashMap::new();
        let mut brands: HashMap<String, f64> = HashMap::new();
        for r in &rows {
            let location = r.store_location.clone().unwrap_or_else(|| UNKNOWN.to_string());
            *locations.entry(location).or_default() += r.total_amount;
            let payment = r.payment_method.clone().unwrap_or_else(|| UNKNOWN.to_string());
            *payments.entry(payment).or_default() += r.total_amount;

            for item in &r.items {
                let line = item.price * item.quantity as f64;
                let category = item.category.clone().unwrap_or_else(|| UNKNOWN.to_string());
                *categories.entry(category).or_default() += line;
                let brand = item.brand.clone().unwrap_or_else(|| UNKNOWN.to_string());
                *brands.entry(brand).or_default() += line;
            }
        }

        ProductMix {
            location_performance: sorted_desc(locations),
            payment_methods: market_shares(payments),
            category_performance: market_shares(categories),
            brand_performance: market_shares(brands),
        }
    }

    pub fn region_insights(&self, rows: &[TransactionRecord], filters: &FilterState) -> RegionInsights {
        let rows = apply_client_filters(rows, filters);

        let mut by_region: HashMap<&str, (usize, f64)> = HashMap::new();
        for r in &rows {
            if let Some(region) = r.store_location.as_deref() {
                let entry = by_region.entry(region).or_default();
                entry.0 += 1;
                entry.1 += r.total_amount;
            }
        }

        let mut regional_data: Vec<RegionSummary> = by_region
            .into_iter()
            .map(|(region, (transactions, revenue))| RegionSummary {
                region: region.to_string(),
                transactions,
                revenue,
                avg_basket: average_basket(revenue, transactions),
            })
            .collect();
        regional_data.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.region.cmp(&b.region)));

        RegionInsights {
            total_regions: regional_data.len(),
            regional_data,
        }
    }

    /// Selectable values with the number of transactions carrying each.
    pub fn filter_options(&self, rows: &[TransactionRecord]) -> FilterOptions {
        let mut regions: HashMap<String, usize> = HashMap::new();
        let mut brands: HashMap<String, usize> = HashMap::new();
        let mut categories: HashMap<String, usize> = HashMap::new();
        let mut payments: HashMap<String, usize> = HashMap::new();

        for r in rows {
            if let Some(location) = &r.store_location {
                *regions.entry(location.clone()).or_default() += 1;
            }
            if let Some(payment) = &r.payment_method {
                *payments.entry(payment.clone()).or_default() += 1;
            }
            for brand in r.brands().collect::<HashSet<_>>() {
                *brands.entry(brand.to_string()).or_default() += 1;
            }
            for category in r.categories().collect::<HashSet<_>>() {
                *categories.entry(category.to_string()).or_default() += 1;
            }
        }

        FilterOptions {
            regions: counted_desc(regions),
            brands: counted_desc(brands),
            categories: counted_desc(categories),
            payment_methods: counted_desc(payments),
            age_groups: AGE_GROUPS.to_vec(),
            genders: GENDERS.to_vec(),
        }
    }
}
