// PostgREST data source - Supabase-style REST reads over the transactions table
use crate::application::data_source::{DataSource, SourceError};
use crate::domain::transaction::{LineItem, TransactionQuery, TransactionRecord};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// PostgREST's default `max-rows`.
pub const POSTGREST_MAX_ROWS: usize = 1000;

const ROW_COLUMNS: &str =
    "id,total_amount,created_at,customer_age,customer_gender,store_location,payment_method";
const ITEM_EMBED: &str = "transaction_items(quantity,price,products(name,category,brands(name)))";

#[derive(Debug, Clone)]
pub struct PostgrestSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
    embed_items: bool,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct WireTransaction {
    id: serde_json::Value,
    #[serde(default)]
    total_amount: Option<f64>,
    created_at: String,
    #[serde(default)]
    customer_age: Option<u32>,
    #[serde(default)]
    customer_gender: Option<String>,
    #[serde(default)]
    store_location: Option<String>,
    #[serde(default)]
    payment_method: Option<String>,
    #[serde(default)]
    transaction_items: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    #[serde(default)]
    quantity: Option<u32>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    products: Option<WireProduct>,
}

#[derive(Debug, Deserialize)]
struct WireProduct {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    brands: Option<WireBrand>,
}

#[derive(Debug, Deserialize)]
struct WireBrand {
    #[serde(default)]
    name: Option<String>,
}

impl WireTransaction {
    fn into_record(self) -> Result<TransactionRecord, SourceError> {
        let id = match self.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        let created_at = parse_timestamp(&self.created_at)
            .ok_or_else(|| SourceError::Decode(format!("bad created_at {:?} on {}", self.created_at, id)))?;

        let items = self
            .transaction_items
            .into_iter()
            .map(|item| {
                let product = item.products;
                LineItem {
                    quantity: item.quantity.unwrap_or(0),
                    price: item.price.unwrap_or(0.0),
                    product_name: product
                        .as_ref()
                        .and_then(|p| p.name.clone())
                        .unwrap_or_default(),
                    category: product.as_ref().and_then(|p| p.category.clone()),
                    brand: product.and_then(|p| p.brands).and_then(|b| b.name),
                }
            })
            .collect();

        Ok(TransactionRecord {
            id,
            created_at,
            total_amount: self.total_amount.unwrap_or(0.0),
            customer_age: self.customer_age,
            customer_gender: self.customer_gender,
            store_location: self.store_location,
            payment_method: self.payment_method,
            items,
        })
    }
}

/// Accepts RFC 3339 and zone-less timestamps (taken as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
                .ok()
                .map(|n| n.and_utc())
        })
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// Quotes a value for an `in.(...)` list.
fn quote_list_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn classify_status(status: StatusCode, body: String) -> SourceError {
    match status {
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => SourceError::Unavailable {
            status: status.as_u16(),
            message: body,
        },
        _ => SourceError::Query {
            status: status.as_u16(),
            message: body,
        },
    }
}

impl PostgrestSource {
    pub fn new(
        base_url: String,
        api_key: String,
        table: String,
        embed_items: bool,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            table,
            embed_items,
            timeout,
        })
    }

    fn filter_params(query: &TransactionQuery) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(from) = query.range.from {
            params.push(("created_at", format!("gte.{}", from.to_rfc3339_opts(SecondsFormat::Millis, true))));
        }
        if let Some(to) = query.range.to {
            params.push(("created_at", format!("lte.{}", to.to_rfc3339_opts(SecondsFormat::Millis, true))));
        }
        if !query.store_locations.is_empty() {
            let list = query
                .store_locations
                .iter()
                .map(|l| quote_list_value(l))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("store_location", format!("in.({})", list)));
        }
        params
    }

    fn build_url(&self, params: &[(&str, String)]) -> String {
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}/rest/v1/{}?{}", self.base_url, self.table, query)
    }

    fn select_columns(&self) -> String {
        if self.embed_items {
            format!("{},{}", ROW_COLUMNS, ITEM_EMBED)
        } else {
            ROW_COLUMNS.to_string()
        }
    }

    fn count_url(&self, query: &TransactionQuery) -> String {
        let mut params = vec![("select", "id".to_string())];
        params.extend(Self::filter_params(query));
        self.build_url(&params)
    }

    fn page_url(&self, query: &TransactionQuery, offset: u64, limit: usize) -> String {
        let mut params = vec![("select", self.select_columns())];
        params.extend(Self::filter_params(query));
        params.push(("order", "created_at.desc,id.desc".to_string()));
        params.push(("offset", offset.to_string()));
        params.push(("limit", limit.to_string()));
        self.build_url(&params)
    }

    fn map_transport(&self, e: reqwest::Error) -> SourceError {
        if e.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else if e.is_decode() {
            SourceError::Decode(e.to_string())
        } else {
            SourceError::Transport(e.to_string())
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SourceError> {
        let response = request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }
        Ok(response)
    }
}

#[async_trait]
impl DataSource for PostgrestSource {
    fn name(&self) -> &'static str {
        "postgrest"
    }

    fn max_page_size(&self) -> usize {
        POSTGREST_MAX_ROWS
    }

    async fn count(&self, query: &TransactionQuery) -> Result<u64, SourceError> {
        let url = self.count_url(query);
        tracing::debug!(%url, "Counting transactions");

        let response = self
            .send(self.client.head(&url).header("Prefer", "count=exact"))
            .await?;

        let header = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| SourceError::Decode("missing Content-Range on count".to_string()))?;

        parse_content_range(header)
            .ok_or_else(|| SourceError::Decode(format!("unreadable Content-Range {:?}", header)))
    }

    async fn fetch_page(
        &self,
        query: &TransactionQuery,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, SourceError> {
        let url = self.page_url(query, offset, limit);
        tracing::trace!(%url, "Fetching transaction page");

        let rows = self
            .send(self.client.get(&url))
            .await?
            .json::<Vec<WireTransaction>>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        rows.into_iter().map(WireTransaction::into_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filters::DateRange;
    use chrono::TimeZone;

    fn source() -> PostgrestSource {
        PostgrestSource::new(
            "https://example.supabase.co/".to_string(),
            "anon".to_string(),
            "transactions".to_string(),
            false,
            Duration::from_secs(30),
        )
        .unwrap()
    }

    #[test]
    fn test_content_range_parsing() {
        assert_eq!(parse_content_range("0-999/18432"), Some(18432));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("*/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_page_url_carries_predicate_order_and_window() {
        let query = TransactionQuery {
            range: DateRange::new(
                Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
                Some(Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()),
            ),
            store_locations: vec!["NCR".to_string()],
        };
        let url = source().page_url(&query, 2000, 1000);

        assert!(url.starts_with("https://example.supabase.co/rest/v1/transactions?select="));
        assert!(url.contains("created_at=gte.2024-06-01T00%3A00%3A00.000Z"));
        assert!(url.contains("created_at=lte.2024-06-30T00%3A00%3A00.000Z"));
        assert!(url.contains("store_location=in.%28%22NCR%22%29"));
        assert!(url.contains("order=created_at.desc%2Cid.desc"));
        assert!(url.ends_with("offset=2000&limit=1000"));
    }

    #[test]
    fn test_status_classification() {
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, String::new()).is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()).is_transient());
        assert!(!classify_status(StatusCode::BAD_REQUEST, "bad filter".into()).is_transient());
    }

    #[test]
    fn test_wire_row_with_embedded_items() {
        let json = r#"{
            "id": 42,
            "total_amount": 250.5,
            "created_at": "2024-06-01T08:15:00+00:00",
            "customer_age": 31,
            "customer_gender": "F",
            "store_location": "NCR",
            "payment_method": "GCash",
            "transaction_items": [
                {"quantity": 2, "price": 45.0,
                 "products": {"name": "Piattos", "category": "Snacks", "brands": {"name": "Jack 'n Jill"}}}
            ]
        }"#;
        let wire: WireTransaction = serde_json::from_str(json).unwrap();
        let record = wire.into_record().unwrap();

        assert_eq!(record.id, "42");
        assert_eq!(record.total_amount, 250.5);
        assert_eq!(record.items[0].brand.as_deref(), Some("Jack 'n Jill"));
        assert_eq!(record.items[0].quantity, 2);
    }

    #[test]
    fn test_zone_less_timestamp_is_utc() {
        let parsed = parse_timestamp("2024-06-01T08:15:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 1, 8, 15, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_list_values_are_quoted() {
        assert_eq!(quote_list_value(r#"Quezon "QC""#), r#""Quezon \"QC\"""#);
    }
}
