//! api error handling for http handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// api error type for handler responses.
///
/// upload and query parsing failures are handled here in the http layer
/// and never reach the service; repository failures surface as an opaque
/// 500 after being logged at the call site.
#[derive(Debug)]
pub enum ApiError {
    /// client error with a contractual plain-text message (400)
    BadRequest(String),
    /// opaque internal server error (500)
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
                .into_response(),
        }
    }
}
