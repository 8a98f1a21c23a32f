//! JSON error responses for non-streaming failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scout::ScoutError;
use serde_json::json;

/// An error returned before any stream starts.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl From<ScoutError> for ApiError {
    fn from(err: ScoutError) -> Self {
        let status = match &err {
            ScoutError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ScoutError::SearchUnavailable(_)
            | ScoutError::LlmUnavailable(_)
            | ScoutError::LlmRateLimited { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.message, "code": self.code })),
        )
            .into_response()
    }
}
