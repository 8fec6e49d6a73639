use crate::application::aggregator::DEFAULT_MAX_SERIES_DAYS;
use crate::application::retry::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub data_source: DataSourceSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Postgrest,
    Fixture,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataSourceSettings {
    pub kind: SourceKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_true")]
    pub embed_items: bool,
    #[serde(default)]
    pub fixture_path: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl DataSourceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy {
            max_attempts: settings.max_attempts,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsSettings {
    /// Offset used for day and hour bucketing
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// Longest daily series returned, in days
    #[serde(default = "default_max_series_days")]
    pub max_series_days: usize,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            max_series_days: default_max_series_days(),
        }
    }
}

fn default_utc_offset_hours() -> i32 {
    8
}

fn default_max_series_days() -> usize {
    DEFAULT_MAX_SERIES_DAYS
}

fn default_table() -> String {
    "transactions".to_string()
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> usize {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

/// `config/scout.{toml,yaml,json}` if present, overridden by
/// `SCOUT__SECTION__KEY` environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/scout").required(false))
        .add_source(
            config::Environment::with_prefix("SCOUT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = parse(
            r#"
            [data_source]
            kind = "fixture"
            fixture_path = "data/transactions.json"
            "#,
        );
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.data_source.kind, SourceKind::Fixture);
        assert_eq!(config.data_source.page_size, 1000);
        assert_eq!(config.data_source.timeout(), Duration::from_secs(30));
        assert_eq!(config.analytics.utc_offset_hours, 8);
        assert_eq!(config.analytics.max_series_days, DEFAULT_MAX_SERIES_DAYS);

        let policy = RetryPolicy::from(&config.retry);
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_postgrest_section() {
        let config = parse(
            r#"
            [server]
            bind = "127.0.0.1:3001"

            [data_source]
            kind = "postgrest"
            url = "https://example.supabase.co"
            api_key = "anon"
            embed_items = false
            page_size = 500

            [retry]
            max_attempts = 5
            initial_delay_ms = 250
            max_delay_ms = 4000
            "#,
        );
        assert_eq!(config.data_source.kind, SourceKind::Postgrest);
        assert!(!config.data_source.embed_items);
        assert_eq!(config.data_source.table, "transactions");
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_partial_analytics_section() {
        let config = parse(
            r#"
            [data_source]
            kind = "fixture"

            [analytics]
            max_series_days = 90
            "#,
        );
        assert_eq!(config.analytics.utc_offset_hours, 8);
        assert_eq!(config.analytics.max_series_days, 90);
    }
}
