//! Registration and login.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthError, Credential};
use crate::logutil::mask_email;
use crate::server::error::{ApiError, LOGIN_FAILED};
use crate::server::sec_log;
use crate::server::state::AppState;
use crate::storage::User;
use crate::validation::{validate_email, validate_password};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Requested token lifetime; capped at the configured lifetime.
    #[serde(default)]
    pub expires_in_seconds: Option<u64>,
}

/// Public view of an account; never includes the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        UserView {
            id: u.id,
            created_at: u.created_at,
            updated_at: u.updated_at,
            email: u.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserView,
    pub token: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;

    let hasher = Arc::clone(&state.hasher);
    let password = req.password;
    let credential = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| anyhow!("hashing task failed: {e}"))??;

    let user = state.storage.save_credential(&email, credential).await?;
    info!("Registered user {} ({})", user.id, mask_email(&user.email));
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    // Unusable input fails exactly like a wrong password.
    let email = match validate_email(&req.email) {
        Ok(e) if !req.password.is_empty() => e,
        _ => return Err(ApiError::Unauthorized(LOGIN_FAILED)),
    };

    let user = state.storage.get_user_by_email(&email).await?;
    let stored: Option<Credential> = user.as_ref().map(|u| u.hashed_password.clone());

    // Unknown accounts still pay for one verification. The blocking task runs
    // to completion even if this request is dropped.
    let hasher = Arc::clone(&state.hasher);
    let password = req.password;
    let verdict = tokio::task::spawn_blocking(move || match stored {
        Some(c) => hasher.verify(&c, &password),
        None => hasher.verify_absent(&password),
    })
    .await
    .map_err(|e| anyhow!("verification task failed: {e}"))?;

    let user = match (verdict, user) {
        (Ok(()), Some(user)) => user,
        (Err(AuthError::Hashing(msg)), _) => {
            return Err(ApiError::Internal(anyhow!("verification failed: {msg}")))
        }
        _ => {
            sec_log!("Failed login for {}", mask_email(&email));
            return Err(ApiError::Unauthorized(LOGIN_FAILED));
        }
    };

    let ttl = token_lifetime(state.tokens.default_ttl(), req.expires_in_seconds);
    let token = state
        .tokens
        .issue(user.id, ttl)
        .map_err(|e| anyhow!("token issue failed: {e}"))?;
    debug!("Issued token for {} valid {}s", user.id, ttl.as_secs());

    Ok(Json(LoginResponse {
        user: UserView::from(&user),
        token,
    }))
}

/// Requested lifetime, falling back to `max` when absent, zero or too long.
fn token_lifetime(max: Duration, requested_secs: Option<u64>) -> Duration {
    match requested_secs {
        Some(secs) if secs > 0 && Duration::from_secs(secs) <= max => Duration::from_secs(secs),
        _ => max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_is_capped() {
        let max = Duration::from_secs(3600);
        assert_eq!(token_lifetime(max, None), max);
        assert_eq!(token_lifetime(max, Some(0)), max);
        assert_eq!(token_lifetime(max, Some(60)), Duration::from_secs(60));
        assert_eq!(token_lifetime(max, Some(3600)), max);
        assert_eq!(token_lifetime(max, Some(86_400)), max);
    }

    #[test]
    fn login_response_is_flat() {
        let resp = LoginResponse {
            user: UserView {
                id: Uuid::nil(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
                email: "a@b.io".into(),
            },
            token: "t".into(),
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["email"], "a@b.io");
        assert_eq!(v["token"], "t");
        assert!(v.get("hashed_password").is_none());
    }
}
