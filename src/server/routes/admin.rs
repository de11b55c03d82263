//! Health, metrics and reset endpoints.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use log::info;

use crate::server::error::ApiError;
use crate::server::sec_log;
use crate::server::state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        "OK",
    )
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let page = format!(
        "<html><body><h1>Welcome, Chirpy Admin</h1><p>Chirpy has been visited {} times!</p></body></html>",
        state.visits.load()
    );
    ([(header::CACHE_CONTROL, "no-cache")], Html(page))
}

/// Delete all users and chirps and zero the visit counter. Refused outside
/// the `dev` platform.
pub async fn reset(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    if !state.config.server.is_dev() {
        sec_log!("Refused reset on platform '{}'", state.config.server.platform);
        return Err(ApiError::Forbidden);
    }
    state.storage.delete_all().await?;
    let previous = state.visits.reset();
    info!("Reset: all users and chirps deleted, visit counter was {}", previous);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "OK",
    ))
}
