//! Bearer token extraction.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;

use super::error::{ApiError, UNAUTHENTICATED};
use super::sec_log;
use super::state::AppState;

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Caller identity recovered from a valid session token.
///
/// Every failure becomes the same `401`; the precise reason only goes to the
/// security log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            sec_log!("Missing bearer token: {} {}", parts.method, parts.uri.path());
            return Err(ApiError::Unauthorized(UNAUTHENTICATED));
        };
        match state.tokens.validate(token) {
            Ok(id) => Ok(AuthenticatedUser(id)),
            Err(e) => {
                sec_log!(
                    "Rejected token ({}): {} {}: {}",
                    e.kind(),
                    parts.method,
                    parts.uri.path(),
                    e
                );
                Err(ApiError::Unauthorized(UNAUTHENTICATED))
            }
        }
    }
}
