// Transaction domain models - rows owned by the remote store
use super::filters::{DateRange, FilterState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub quantity: u32,
    pub price: f64,
    pub product_name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub total_amount: f64,
    pub customer_age: Option<u32>,
    pub customer_gender: Option<String>,
    pub store_location: Option<String>,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl TransactionRecord {
    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|i| i.brand.as_deref())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|i| i.category.as_deref())
    }
}

/// Predicate pushed down to the data source: a time window and an optional
/// store-location allow-list. An empty allow-list means every location.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionQuery {
    pub range: DateRange,
    pub store_locations: Vec<String>,
}

impl TransactionQuery {
    pub fn from_filters(filters: &FilterState) -> Self {
        Self {
            range: filters.date_range.clone(),
            store_locations: filters.selected_regions.clone(),
        }
    }

    /// Same predicate without a time window.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if !self.range.contains(record.created_at) {
            return false;
        }
        if self.store_locations.is_empty() {
            return true;
        }
        record
            .store_location
            .as_ref()
            .is_some_and(|loc| self.store_locations.contains(loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(location: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            id: "t1".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap(),
            total_amount: 120.0,
            customer_age: None,
            customer_gender: None,
            store_location: location.map(str::to_string),
            payment_method: None,
            items: Vec::new(),
        }
    }

    #[test]
    fn test_query_location_allow_list() {
        let query = TransactionQuery {
            range: DateRange::default(),
            store_locations: vec!["NCR".to_string()],
        };
        assert!(query.matches(&record(Some("NCR"))));
        assert!(!query.matches(&record(Some("Cebu"))));
        assert!(!query.matches(&record(None)));
        assert!(TransactionQuery::unbounded().matches(&record(None)));
    }
}
