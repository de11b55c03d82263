//! Route table and request middleware.

mod admin;
mod chirps;
mod users;

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use log::debug;
use tower_http::services::ServeDir;

use super::state::AppState;

pub use self::chirps::ChirpRequest;
pub use self::users::{Credentials, LoginRequest, LoginResponse, UserView};

/// Build the complete router.
///
/// ## Public
/// - `GET /api/healthz` - Liveness probe
/// - `POST /api/users` - Register
/// - `POST /api/login` - Exchange credentials for a session token
/// - `GET /api/chirps` - All chirps, oldest first
/// - `GET /api/chirps/{chirp_id}` - One chirp
/// - `GET /app/*` - Static files (counted)
///
/// ## Bearer token required
/// - `POST /api/chirps` - Post a chirp
///
/// ## Admin
/// - `GET /admin/metrics` - Visit count page
/// - `POST /admin/reset` - Wipe data and counter (dev platform only)
pub fn router(state: AppState) -> Router {
    let app_files = Router::new()
        .nest_service("/app", ServeDir::new(&state.config.server.static_dir))
        .layer(middleware::from_fn_with_state(state.clone(), count_visit));

    let api = Router::new()
        .route("/api/healthz", get(admin::healthz))
        .route("/api/users", post(users::create_user))
        .route("/api/login", post(users::login))
        .route("/api/chirps", get(chirps::list_chirps).post(chirps::create_chirp))
        .route("/api/chirps/{chirp_id}", get(chirps::get_chirp))
        .route("/admin/metrics", get(admin::metrics))
        .route("/admin/reset", post(admin::reset));

    Router::new()
        .merge(app_files)
        .merge(api)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn count_visit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.visits.increment();
    next.run(request).await
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    debug!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}
