// Source factory - picks the single configured DataSource for this deployment
use crate::application::data_source::DataSource;
use crate::infrastructure::config::{DataSourceSettings, SourceKind};
use crate::infrastructure::fixture_source::FixtureSource;
use crate::infrastructure::postgrest_source::PostgrestSource;
use anyhow::Context;
use std::sync::Arc;

pub fn build_data_source(settings: &DataSourceSettings) -> anyhow::Result<Arc<dyn DataSource>> {
    match settings.kind {
        SourceKind::Postgrest => {
            let url = settings
                .url
                .clone()
                .context("data_source.url is required for the postgrest source")?;
            let api_key = settings
                .api_key
                .clone()
                .context("data_source.api_key is required for the postgrest source")?;
            Ok(Arc::new(PostgrestSource::new(
                url,
                api_key,
                settings.table.clone(),
                settings.embed_items,
                settings.timeout(),
            )?))
        }
        SourceKind::Fixture => {
            let path = settings
                .fixture_path
                .as_deref()
                .context("data_source.fixture_path is required for the fixture source")?;
            Ok(Arc::new(FixtureSource::from_file(path, settings.page_size)?))
        }
    }
}
