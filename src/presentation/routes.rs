// Router - API routes plus compression, tracing and CORS layers
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    consumer_insights, dashboard_metrics, filter_options, health_check, product_mix,
    region_insights, transaction_analysis,
};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/dashboard/metrics", get(dashboard_metrics))
        .route("/api/transactions/analysis", get(transaction_analysis))
        .route("/api/consumers/insights", get(consumer_insights))
        .route("/api/products/mix", get(product_mix))
        .route("/api/regions/insights", get(region_insights))
        .route("/api/filters/options", get(filter_options))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
