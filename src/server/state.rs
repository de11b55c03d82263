//! Shared application state.

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::admission::AdmissionPolicy;
use crate::auth::{CredentialHasher, SessionTokenCodec};
use crate::config::Config;
use crate::metrics::VisitCounter;
use crate::storage::Storage;

/// Everything a handler needs, built once from [`Config`] and cloned cheaply
/// into each request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<Storage>,
    pub hasher: Arc<CredentialHasher>,
    pub tokens: Arc<SessionTokenCodec>,
    pub admission: Arc<AdmissionPolicy>,
    pub visits: Arc<VisitCounter>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let storage = Storage::new(&config.storage.data_dir)
            .await
            .map_err(|e| anyhow!("Failed to open data directory {}: {}", config.storage.data_dir, e))?;
        let argon2 = config.security.as_ref().and_then(|s| s.argon2.as_ref());
        let hasher = CredentialHasher::from_config(argon2)
            .map_err(|e| anyhow!("Invalid [security.argon2] settings: {}", e))?;
        let tokens = SessionTokenCodec::from_config(&config.auth);
        let admission = AdmissionPolicy::from_config(&config.admission);

        Ok(AppState {
            config: Arc::new(config),
            storage: Arc::new(storage),
            hasher: Arc::new(hasher),
            tokens: Arc::new(tokens),
            admission: Arc::new(admission),
            visits: Arc::new(VisitCounter::new()),
        })
    }
}
