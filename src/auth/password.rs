//! Argon2id credential hashing.
//!
//! Hashes are stored in PHC string format (`$argon2id$v=19$m=...`), so the
//! parameters a hash was produced with travel with it. Changing the configured
//! work factor only affects new hashes; existing ones keep verifying.

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::config::Argon2Config;

/// One-way hash of a user secret, as persisted next to the user record.
///
/// No `PartialEq`; compare only through [`CredentialHasher::verify`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a stored PHC string. The value is not checked here; a malformed
    /// string simply never verifies.
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Credential(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Salted, adaptive hasher for user secrets.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    decoy: Credential,
}

impl CredentialHasher {
    /// Build a hasher with explicit Argon2 params (crate defaults when `None`).
    pub fn new(params: Option<Params>) -> Result<Self, AuthError> {
        let argon2 = match params {
            Some(p) => Argon2::new(Algorithm::Argon2id, Version::V0x13, p),
            None => Argon2::default(),
        };
        // Hash of a random throwaway secret; verified against when an account
        // does not exist so both login failures cost the same.
        let throwaway = Alphanumeric.sample_string(&mut rand::thread_rng(), 32);
        let decoy = Self::hash_with(&argon2, &throwaway)?;
        Ok(CredentialHasher { argon2, decoy })
    }

    /// Build a hasher from the optional `[security.argon2]` section.
    pub fn from_config(cfg: Option<&Argon2Config>) -> Result<Self, AuthError> {
        let params = match cfg {
            Some(a) => {
                let defaults = Params::DEFAULT;
                let mem = a.memory_kib.unwrap_or(defaults.m_cost());
                let time = a.time_cost.unwrap_or(defaults.t_cost());
                let para = a.parallelism.unwrap_or(defaults.p_cost());
                let params = Params::new(mem, time, para, None)
                    .map_err(|e| AuthError::Hashing(format!("invalid argon2 params: {e}")))?;
                Some(params)
            }
            None => None,
        };
        Self::new(params)
    }

    /// Hash `secret` with a freshly generated salt.
    pub fn hash(&self, secret: &str) -> Result<Credential, AuthError> {
        Self::hash_with(&self.argon2, secret)
    }

    /// Check `secret` against `credential`.
    ///
    /// A stored value that is not a parseable PHC string is reported exactly
    /// like a wrong secret.
    pub fn verify(&self, credential: &Credential, secret: &str) -> Result<(), AuthError> {
        let parsed = match PasswordHash::new(credential.as_str()) {
            Ok(p) => p,
            Err(_) => return Err(AuthError::Mismatch),
        };
        self.argon2
            .verify_password(secret.as_bytes(), &parsed)
            .map_err(|_| AuthError::Mismatch)
    }

    /// Burn one verification for an account that does not exist. Always
    /// returns [`AuthError::Mismatch`].
    pub fn verify_absent(&self, secret: &str) -> Result<(), AuthError> {
        let _ = self.verify(&self.decoy, secret);
        Err(AuthError::Mismatch)
    }

    fn hash_with(argon2: &Argon2<'static>, secret: &str) -> Result<Credential, AuthError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Credential(hash.to_string()))
    }
}
