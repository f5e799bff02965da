use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request problems detected before any upstream call is made
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing required parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("Invalid date '{0}', expected YYYYMMDD")]
    InvalidDate(String),
    #[error("Unknown station '{0}'")]
    UnknownStation(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
