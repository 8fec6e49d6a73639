// HTTP response utilities - the `{ success, data?, error? }` JSON envelope
use crate::application::analytics_service::AnalyticsError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn ok_response<T: Serialize>(data: T) -> Response {
    let body = ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        data: None,
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for AnalyticsError {
    fn into_response(self) -> Response {
        let status = match &self {
            AnalyticsError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AnalyticsError::Query(_) => StatusCode::BAD_GATEWAY,
        };
        tracing::error!(error = %self, status = status.as_u16(), "Analytics request failed");
        error_response(status, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_absent_fields() {
        let ok = serde_json::to_value(ApiResponse {
            success: true,
            data: Some(3),
            error: None,
        })
        .unwrap();
        assert_eq!(ok, serde_json::json!({ "success": true, "data": 3 }));

        let err = serde_json::to_value(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some("boom".to_string()),
        })
        .unwrap();
        assert_eq!(err, serde_json::json!({ "success": false, "error": "boom" }));
    }
}
