// HTTP request handlers
use crate::application::url_codec;
use crate::domain::filters::FilterState;
use crate::infrastructure::http_response::{error_response, ok_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    source: &'static str,
    timestamp: String,
}

/// Filters for a view: trailing 30 days unless the query names dates.
fn windowed_filters(query: Option<String>) -> FilterState {
    let mut filters = FilterState::with_defaults(Utc::now());
    url_codec::decode(query.as_deref().unwrap_or_default()).apply_to(&mut filters);
    filters
}

/// Filters with no implicit date window.
fn unwindowed_filters(query: Option<String>) -> FilterState {
    let mut filters = FilterState::default();
    url_codec::decode(query.as_deref().unwrap_or_default()).apply_to(&mut filters);
    filters
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let source = state.analytics_service.source_name();
    match state.analytics_service.health().await {
        Ok(()) => ok_response(HealthStatus {
            status: "healthy",
            source,
            timestamp: Utc::now().to_rfc3339(),
        }),
        Err(e) => {
            tracing::warn!(source, error = %e, "Health check failed");
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

pub async fn dashboard_metrics(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Response {
    let filters = windowed_filters(query);
    match state.analytics_service.dashboard_metrics(&filters).await {
        Ok(metrics) => ok_response(metrics),
        Err(e) => e.into_response(),
    }
}

pub async fn transaction_analysis(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Response {
    let filters = windowed_filters(query);
    match state.analytics_service.transaction_trends(&filters).await {
        Ok(trends) => ok_response(trends),
        Err(e) => e.into_response(),
    }
}

pub async fn consumer_insights(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Response {
    let filters = windowed_filters(query);
    match state.analytics_service.consumer_insights(&filters).await {
        Ok(insights) => ok_response(insights),
        Err(e) => e.into_response(),
    }
}

pub async fn product_mix(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Response {
    let filters = windowed_filters(query);
    match state.analytics_service.product_mix(&filters).await {
        Ok(mix) => ok_response(mix),
        Err(e) => e.into_response(),
    }
}

/// Region totals over all time unless dates are given
pub async fn region_insights(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Response {
    let filters = unwindowed_filters(query);
    match state.analytics_service.region_insights(&filters).await {
        Ok(insights) => ok_response(insights),
        Err(e) => e.into_response(),
    }
}

pub async fn filter_options(State(state): State<Arc<AppState>>) -> Response {
    match state.analytics_service.filter_options().await {
        Ok(options) => ok_response(options),
        Err(e) => e.into_response(),
    }
}
