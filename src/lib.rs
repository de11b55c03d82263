//! # Chirpy - Short-Post HTTP Service
//!
//! Chirpy is a small social-posting service: users register with an email
//! and password, log in to receive a session token, and post short "chirps".
//!
//! ## Features
//!
//! - **Credentials**: Argon2id hashing with per-hash random salts and a
//!   configurable work factor; uniform failures for unknown accounts and
//!   wrong passwords.
//! - **Session Tokens**: Stateless HS256 tokens binding a user id to a
//!   validity window. No server-side session store.
//! - **Content Admission**: 140-byte limit and banned-term masking applied
//!   before a chirp is stored.
//! - **File Storage**: JSON records with locked, atomic writes.
//! - **Async Design**: Built on Tokio and axum.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chirpy::config::Config;
//! use chirpy::server::ChirpyServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let server = ChirpyServer::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`auth`] - Credential hashing and session tokens
//! - [`admission`] - Chirp length check and moderation
//! - [`validation`] - Request input validation and safe file naming
//! - [`storage`] - User and chirp persistence
//! - [`server`] - HTTP routes and handlers
//! - [`config`] - Configuration loading and validation
//! - [`metrics`] - Visit counter
//! - [`logutil`] - Log sanitizing helpers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   HTTP Server   │ ← routing, JSON, bearer extraction
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │ auth, admission │ ← pure, stateless core
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │    Storage      │ ← JSON files
//! └─────────────────┘
//! ```

pub mod admission;
pub mod auth;
pub mod config;
pub mod logutil;
pub mod metrics;
pub mod server;
pub mod storage;
pub mod validation;
