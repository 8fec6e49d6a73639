// Application state for HTTP handlers
use crate::application::analytics_service::AnalyticsService;

#[derive(Clone)]
pub struct AppState {
    pub analytics_service: AnalyticsService,
}
