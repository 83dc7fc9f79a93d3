use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// Operation not legal for the session's current status.
    InvalidState(String),
    /// Wall-clock budget exhausted; the session has been auto-completed.
    Expired(String),
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

fn plain(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let mut response = plain(StatusCode::UNAUTHORIZED, message.to_string());
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => plain(StatusCode::FORBIDDEN, message.to_string()),
            ApiError::BadRequest(message) => plain(StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => plain(StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => plain(StatusCode::CONFLICT, message),
            ApiError::InvalidState(message) => plain(StatusCode::UNPROCESSABLE_ENTITY, message),
            ApiError::Expired(message) => plain(StatusCode::GONE, message),
            ApiError::TooManyRequests(message) => {
                plain(StatusCode::TOO_MANY_REQUESTS, message.to_string())
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                plain(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}
