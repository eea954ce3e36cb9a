use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use fundcrm_core::CoreError;

/// Error body outside the core taxonomy (e.g. 401).
pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "status": status.as_u16(),
        })),
    )
        .into_response()
}

pub fn core_error_to_response(err: CoreError) -> Response {
    let envelope = err.to_envelope();
    let status = StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(envelope)).into_response()
}

/// Handler error: any [`CoreError`] rendered as its envelope.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(value: CoreError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        core_error_to_response(self.0)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
