//! HTTP error type and JSON error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;

use crate::admission::AdmissionError;
use crate::auth::AuthError;
use crate::storage::StorageError;
use crate::validation::InputError;

/// Body returned for every failed login, whatever the reason.
pub const LOGIN_FAILED: &str = "Incorrect email or password";
/// Body returned for every rejected bearer token, whatever the reason.
pub const UNAUTHENTICATED: &str = "Unauthenticated";

/// Error type for handlers; converts into a status code plus `{"error": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<InputError> for ApiError {
    fn from(e: InputError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Mismatch => ApiError::Unauthorized(LOGIN_FAILED),
            AuthError::Hashing(msg) => ApiError::Internal(anyhow::anyhow!("hashing failed: {msg}")),
        }
    }
}

impl From<AdmissionError> for ApiError {
    fn from(_: AdmissionError) -> Self {
        ApiError::BadRequest("Chirp is too long".to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::EmailTaken => {
                ApiError::Conflict("An account with this email already exists".to_string())
            }
            StorageError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Internal(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (InputError::EmptyEmail.into(), StatusCode::BAD_REQUEST),
            (AuthError::Mismatch.into(), StatusCode::UNAUTHORIZED),
            (AuthError::Hashing("x".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
            (
                AdmissionError::LengthExceeded { length: 141, limit: 140 }.into(),
                StatusCode::BAD_REQUEST,
            ),
            (StorageError::EmailTaken.into(), StatusCode::CONFLICT),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn length_error_hides_overage() {
        let err: ApiError = AdmissionError::LengthExceeded { length: 999, limit: 140 }.into();
        assert!(!err.to_string().contains("999"));
    }
}
