// Dashboard metrics domain models - derived, never mutated in place
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(date: String, value: f64) -> Self {
        Self { date, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub revenue: f64,
    pub transactions: usize,
    pub avg_basket_size: f64,
    /// Distinct (age, gender, location) tuples; an approximation, see
    /// `aggregator::estimate_customers`.
    pub active_customers: usize,
    pub revenue_trend: f64,
    pub transactions_trend: f64,
    pub basket_trend: f64,
    pub customers_trend: f64,
    pub revenue_trend_data: Vec<ChartPoint>,
    pub top_locations: Vec<NamedValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub day: &'static str,
    pub hour: u32,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTrends {
    pub daily_volume: Vec<ChartPoint>,
    pub value_distribution: Vec<ChartPoint>,
    pub hourly_heatmap: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareEntry {
    pub name: String,
    /// Whole percent of all transactions.
    pub value: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerInsights {
    pub age_distribution: Vec<ShareEntry>,
    pub gender_distribution: Vec<ShareEntry>,
    pub shopping_times: Vec<ShareEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketShare {
    pub name: String,
    pub value: f64,
    pub market_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMix {
    pub location_performance: Vec<NamedValue>,
    pub payment_methods: Vec<MarketShare>,
    pub category_performance: Vec<MarketShare>,
    pub brand_performance: Vec<MarketShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    pub region: String,
    pub transactions: usize,
    pub revenue: f64,
    pub avg_basket: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionInsights {
    pub regional_data: Vec<RegionSummary>,
    pub total_regions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub regions: Vec<FilterOption>,
    pub brands: Vec<FilterOption>,
    pub categories: Vec<FilterOption>,
    pub payment_methods: Vec<FilterOption>,
    pub age_groups: Vec<&'static str>,
    pub genders: Vec<&'static str>,
}
