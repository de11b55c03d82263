//! # Authentication Module - Credentials and Session Tokens
//!
//! Two independent, stateless components make up the trust layer of Chirpy:
//!
//! - [`password`] - Argon2id credential hashing and verification
//! - [`token`] - HS256 session token issuance and validation
//!
//! Neither component holds mutable state. Both are built once from the
//! process [`Config`](crate::config::Config) and shared behind an `Arc` by the
//! HTTP layer.
//!
//! ## Login flow
//!
//! ```text
//! email + password ──→ Storage::lookup_credential_by_email
//!                                │
//!                    CredentialHasher::verify
//!                                │
//!                    SessionTokenCodec::issue ──→ bearer token
//! ```
//!
//! ## Error uniformity
//!
//! Callers must not reveal *why* authentication failed. [`AuthError::Mismatch`]
//! covers both a wrong secret and an unusable stored hash, and every
//! [`TokenError`] except [`TokenError::Signing`] collapses into a single
//! "unauthenticated" response at the HTTP boundary. The specific variant is
//! only ever written to the security log.

pub mod password;
pub mod token;

pub use password::{Credential, CredentialHasher};
pub use token::{Claims, SessionTokenCodec, TOKEN_ISSUER};

use thiserror::Error;

/// Failures from [`CredentialHasher`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The hash could not be computed (bad parameters, RNG failure).
    #[error("credential hashing failed: {0}")]
    Hashing(String),

    /// The secret does not correspond to the stored credential.
    #[error("credentials do not match")]
    Mismatch,
}

/// Reasons a session token is refused (or could not be produced).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Signature does not verify against the configured secret.
    #[error("token signature is invalid")]
    BadSignature,

    /// The validity window has ended.
    #[error("token has expired")]
    Expired,

    /// The token cannot be parsed or lacks required claims.
    #[error("token is malformed: {0}")]
    Malformed(String),

    /// The subject claim is not a valid user identifier.
    #[error("token subject is not a valid identifier: {0}")]
    UnknownSubject(String),

    /// Signing failed while issuing a token.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl TokenError {
    /// Short, stable label used in security log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::BadSignature => "bad_signature",
            TokenError::Expired => "expired",
            TokenError::Malformed(_) => "malformed",
            TokenError::UnknownSubject(_) => "unknown_subject",
            TokenError::Signing(_) => "signing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_error_kinds_are_distinct() {
        let kinds = [
            TokenError::BadSignature.kind(),
            TokenError::Expired.kind(),
            TokenError::Malformed("x".into()).kind(),
            TokenError::UnknownSubject("x".into()).kind(),
            TokenError::Signing("x".into()).kind(),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }
}
