//! Posting and reading chirps.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::admission::Admission;
use crate::logutil::escape_log;
use crate::server::auth::AuthenticatedUser;
use crate::server::error::ApiError;
use crate::server::state::AppState;
use crate::storage::Chirp;
use crate::validation::parse_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChirpRequest {
    #[serde(default)]
    pub body: String,
}

pub async fn create_chirp(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    payload: Result<Json<ChirpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Chirp>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let body = match state.admission.admit(&req.body) {
        Admission::Accepted(body) => body,
        Admission::Rejected(e) => {
            debug!(
                "Rejected chirp from {}: {} bytes over by {}",
                user_id,
                req.body.len(),
                e.overage()
            );
            return Err(e.into());
        }
    };

    let chirp = state.storage.save_post(user_id, &body).await?;
    info!("Chirp {} by {}: {}", chirp.id, user_id, escape_log(&chirp.body));
    Ok((StatusCode::CREATED, Json(chirp)))
}

pub async fn list_chirps(State(state): State<AppState>) -> Result<Json<Vec<Chirp>>, ApiError> {
    Ok(Json(state.storage.get_chirps().await?))
}

pub async fn get_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<String>,
) -> Result<Json<Chirp>, ApiError> {
    let id = parse_id(&chirp_id)?;
    match state.storage.get_chirp(id).await? {
        Some(chirp) => Ok(Json(chirp)),
        None => Err(ApiError::NotFound(format!("Chirp {} not found", id))),
    }
}
