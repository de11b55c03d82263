//! # HTTP Server Module
//!
//! Thin HTTP surface over the core components. Handlers decode JSON, call
//! into [`auth`](crate::auth), [`admission`](crate::admission) and
//! [`storage`](crate::storage), and map every failure through [`ApiError`].
//!
//! ## Components
//!
//! - [`state`] - [`AppState`] shared by all handlers
//! - [`routes`] - Route table and handlers
//! - [`auth`] - Bearer token extractor
//! - [`error`] - Error to response mapping
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chirpy::config::Config;
//! use chirpy::server::ChirpyServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let server = ChirpyServer::new(config).await?;
//!     server.run().await
//! }
//! ```

macro_rules! sec_log {
    ($($arg:tt)*) => { log::warn!(target: "security", $($arg)*); };
}
pub(crate) use sec_log;

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use self::error::ApiError;
pub use self::state::AppState;

use anyhow::{anyhow, Result};
use axum::Router;
use log::info;
use tokio::net::TcpListener;

use crate::config::Config;

/// Owns the application state and serves the router.
pub struct ChirpyServer {
    state: AppState,
}

impl ChirpyServer {
    /// Build storage, hasher, token codec and admission policy from `config`.
    ///
    /// # Errors
    ///
    /// Fails if the data directory cannot be created or the Argon2 parameters
    /// are invalid.
    pub async fn new(config: Config) -> Result<Self> {
        let state = AppState::new(config).await?;
        Ok(ChirpyServer { state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        routes::router(self.state.clone())
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.server.bind_addr.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| anyhow!("Failed to bind {}: {}", addr, e))?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        info!(
            "Chirpy listening on http://{} (platform: {})",
            local, self.state.config.server.platform
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Chirpy stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            log::warn!("Cannot listen for Ctrl-C ({}); running until killed", e);
            std::future::pending::<()>().await
        }
    }
}
