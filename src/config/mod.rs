//! # Configuration Management Module
//!
//! All runtime settings for Chirpy live in a single TOML file, parsed into
//! [`Config`] once at startup and then handed by reference to each component's
//! constructor. Nothing reads configuration from global state afterwards.
//!
//! ## Configuration Structure
//!
//! - [`ServerConfig`] - Bind address, platform mode, static file root
//! - [`AuthConfig`] - Token signing secret and lifetime
//! - [`SecurityConfig`] - Argon2 work factor
//! - [`AdmissionConfig`] - Chirp length limit and banned terms
//! - [`StorageConfig`] - Data directory
//! - [`LoggingConfig`] - Log level and files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chirpy::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Write a starter file with a fresh random signing secret
//!     Config::create_default("config.toml").await?;
//!
//!     let config = Config::load("config.toml").await?;
//!     println!("Listening on {}", config.server.bind_addr);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [server]
//! bind_addr = "127.0.0.1:8080"
//! platform = "dev"
//! static_dir = "."
//!
//! [auth]
//! token_secret = "change-me-to-at-least-32-random-bytes"
//! token_ttl_seconds = 3600
//!
//! [admission]
//! max_length = 140
//! banned_terms = ["kerfuffle", "sharbert", "fornax"]
//! ```
//!
//! ## Environment Integration
//!
//! `CHIRPY_TOKEN_SECRET` and `CHIRPY_PLATFORM` override the file values so
//! the secret does not have to be committed alongside the config.

use anyhow::{anyhow, Result};
use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::fs;

use crate::admission::{CaseMatching, DEFAULT_BANNED_TERMS, DEFAULT_MASK, MAX_CHIRP_LENGTH};

/// Environment variable overriding [`AuthConfig::token_secret`].
pub const ENV_TOKEN_SECRET: &str = "CHIRPY_TOKEN_SECRET";
/// Environment variable overriding [`ServerConfig::platform`].
pub const ENV_PLATFORM: &str = "CHIRPY_PLATFORM";

/// Shortest signing secret accepted, in bytes (HS256 key size).
pub const MIN_SECRET_BYTES: usize = 32;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub security: Option<SecurityConfig>,
    #[serde(default)]
    pub admission: AdmissionConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Deployment mode. Only `"dev"` permits `POST /admin/reset`.
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Directory served under `/app/`.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_platform() -> String {
    "prod".to_string()
}

fn default_static_dir() -> String {
    ".".to_string()
}

impl ServerConfig {
    pub fn is_dev(&self) -> bool {
        self.platform.eq_ignore_ascii_case("dev")
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens.
    pub token_secret: String,
    /// Default and maximum token lifetime.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
}

fn default_token_ttl() -> u64 {
    3600
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"<redacted>")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Argon2Config {
    #[serde(default)]
    pub memory_kib: Option<u32>,
    #[serde(default)]
    pub time_cost: Option<u32>,
    #[serde(default)]
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub argon2: Option<Argon2Config>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_banned_terms")]
    pub banned_terms: Vec<String>,
    #[serde(default = "default_mask")]
    pub mask: String,
    #[serde(default)]
    pub case_matching: CaseMatching,
}

fn default_max_length() -> usize {
    MAX_CHIRP_LENGTH
}

fn default_banned_terms() -> Vec<String> {
    DEFAULT_BANNED_TERMS.iter().map(|t| t.to_string()).collect()
}

fn default_mask() -> String {
    DEFAULT_MASK.to_string()
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        AdmissionConfig {
            max_length: default_max_length(),
            banned_terms: default_banned_terms(),
            mask: default_mask(),
            case_matching: CaseMatching::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    #[serde(default)]
    pub security_file: Option<String>,
}

/// Random alphanumeric signing secret for freshly generated configs.
pub fn generate_secret() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), 64)
}

impl Config {
    /// Load configuration from a file, apply environment overrides and validate.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file with a random signing secret
    pub async fn create_default(path: &str) -> Result<()> {
        let mut config = Config::default();
        config.auth.token_secret = generate_secret();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var(ENV_TOKEN_SECRET) {
            if !secret.is_empty() {
                self.auth.token_secret = secret;
            }
        }
        if let Ok(platform) = std::env::var(ENV_PLATFORM) {
            if !platform.is_empty() {
                self.server.platform = platform;
            }
        }
    }

    /// Reject settings the service cannot run safely with.
    pub fn validate(&self) -> Result<()> {
        if self.auth.token_secret.len() < MIN_SECRET_BYTES {
            return Err(anyhow!(
                "auth.token_secret must be at least {} bytes (set it in the config file or via {})",
                MIN_SECRET_BYTES,
                ENV_TOKEN_SECRET
            ));
        }
        if self.auth.token_ttl_seconds == 0 {
            return Err(anyhow!("auth.token_ttl_seconds must be greater than zero"));
        }
        if self.admission.max_length == 0 {
            return Err(anyhow!("admission.max_length must be greater than zero"));
        }
        if self.admission.mask.is_empty() {
            return Err(anyhow!("admission.mask cannot be empty"));
        }
        if self.admission.banned_terms.iter().any(|t| t.trim().is_empty()) {
            return Err(anyhow!("admission.banned_terms cannot contain empty entries"));
        }
        self.server
            .bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| anyhow!("Invalid server.bind_addr '{}': {}", self.server.bind_addr, e))?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                bind_addr: "127.0.0.1:8080".to_string(),
                platform: default_platform(),
                static_dir: default_static_dir(),
            },
            auth: AuthConfig {
                // Placeholder; `create_default` and `init` write a random one.
                token_secret: String::new(),
                token_ttl_seconds: default_token_ttl(),
            },
            security: Some(SecurityConfig::default()),
            admission: AdmissionConfig::default(),
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("chirpy.log".to_string()),
                security_file: Some("chirpy-security.log".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut cfg = Config::default();
        cfg.auth.token_secret = generate_secret();
        cfg
    }

    #[test]
    fn default_with_secret_validates() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn empty_default_secret_is_rejected() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn short_secret_is_rejected() {
        let mut cfg = valid();
        cfg.auth.token_secret = "short".into();
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("token_secret"));
    }

    #[test]
    fn zero_ttl_and_limit_rejected() {
        let mut cfg = valid();
        cfg.auth.token_ttl_seconds = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.admission.max_length = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_bind_addr_rejected() {
        let mut cfg = valid();
        cfg.server.bind_addr = "not an address".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn generated_secrets_differ() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn toml_roundtrip_keeps_admission_settings() {
        let mut cfg = valid();
        cfg.admission.case_matching = CaseMatching::Insensitive;
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("case_matching = \"insensitive\""));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.admission.case_matching, CaseMatching::Insensitive);
        assert_eq!(back.admission.banned_terms, cfg.admission.banned_terms);
        assert_eq!(back.auth.token_secret, cfg.auth.token_secret);
    }

    #[test]
    fn missing_optional_sections_use_defaults() {
        let text = r#"
            [server]
            bind_addr = "0.0.0.0:9000"

            [auth]
            token_secret = "0123456789abcdef0123456789abcdef"

            [storage]
            data_dir = "/tmp/chirpy"

            [logging]
            level = "debug"
        "#;
        let cfg: Config = toml::from_str(text).unwrap();
        assert_eq!(cfg.server.platform, "prod");
        assert!(!cfg.server.is_dev());
        assert_eq!(cfg.auth.token_ttl_seconds, 3600);
        assert_eq!(cfg.admission.max_length, MAX_CHIRP_LENGTH);
        assert_eq!(cfg.admission.mask, "****");
        assert!(cfg.security.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn debug_redacts_secret() {
        let cfg = valid();
        let dbg = format!("{:?}", cfg.auth);
        assert!(!dbg.contains(&cfg.auth.token_secret));
    }
}
