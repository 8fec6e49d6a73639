// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use scout_analytics::application::aggregator::Aggregator;
use scout_analytics::application::analytics_service::AnalyticsService;
use scout_analytics::application::batched_fetcher::BatchedFetcher;
use scout_analytics::application::retry::RetryPolicy;
use scout_analytics::infrastructure::config::load_app_config;
use scout_analytics::infrastructure::source_factory::build_data_source;
use scout_analytics::presentation::app_state::AppState;
use scout_analytics::presentation::routes::router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load configuration")?;

    // Create data source (infrastructure layer)
    let source = build_data_source(&config.data_source)?;
    tracing::info!(source = source.name(), "Data source ready");

    // Create services (application layer)
    let aggregator = Aggregator::with_offset_hours(config.analytics.utc_offset_hours)
        .context("analytics.utc_offset_hours is out of range")?
        .with_max_series_days(config.analytics.max_series_days);
    let fetcher = BatchedFetcher::new(source, config.data_source.page_size, config.data_source.timeout());
    let analytics_service = AnalyticsService::new(fetcher, RetryPolicy::from(&config.retry), aggregator);

    // Create application state
    let state = Arc::new(AppState { analytics_service });

    // Build router (presentation layer)
    let app = router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!(%addr, "Starting scout-analytics service");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
