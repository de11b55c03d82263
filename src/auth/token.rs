//! Stateless HS256 session tokens.
//!
//! A token is a JWT whose claims bind a user id to a validity window:
//!
//! ```text
//! { "iss": "chirpy", "sub": "<uuid>", "iat": <unix secs>, "exp": <unix secs> }
//! ```
//!
//! Nothing is persisted. Validity is a function of the signature and the wall
//! clock only, so there is no refresh, no sliding expiry and no revocation: a
//! token stays good for its whole stated lifetime.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TokenError;
use crate::config::AuthConfig;

/// Fixed issuer written into, and required from, every token.
pub const TOKEN_ISSUER: &str = "chirpy";

const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Registered claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates session tokens with a shared signing secret.
#[derive(Clone)]
pub struct SessionTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    default_ttl: Duration,
}

impl SessionTokenCodec {
    pub fn new(secret: &[u8], default_ttl: Duration) -> Self {
        SessionTokenCodec {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            default_ttl,
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(
            cfg.token_secret.as_bytes(),
            Duration::from_secs(cfg.token_ttl_seconds),
        )
    }

    /// Lifetime used by [`issue_default`](Self::issue_default).
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token for `subject`, valid from now for `ttl`.
    pub fn issue(&self, subject: Uuid, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now(), ttl)
    }

    /// Issue a token with the configured default lifetime.
    pub fn issue_default(&self, subject: Uuid) -> Result<String, TokenError> {
        self.issue(subject, self.default_ttl)
    }

    /// Issue a token whose window starts at `issued_at`.
    pub fn issue_at(
        &self,
        subject: Uuid,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            iss: TOKEN_ISSUER.to_string(),
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(ttl_secs),
        };
        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate `token` and recover its subject.
    ///
    /// The token is refused once `now > exp`; there is no leeway.
    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        let claims = self.decode_claims(token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| TokenError::UnknownSubject(claims.sub))
    }

    /// Verify signature, issuer and window, returning the raw claims.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    const SECRET: &[u8] = b"unit-test-secret-unit-test-secret!";

    fn codec() -> SessionTokenCodec {
        SessionTokenCodec::new(SECRET, Duration::from_secs(3600))
    }

    fn sign_raw(claims: &Claims, secret: &[u8]) -> String {
        encode(
            &Header::new(TOKEN_ALGORITHM),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn issue_then_validate_returns_subject() {
        let id = Uuid::new_v4();
        let token = codec().issue(id, Duration::from_secs(60)).unwrap();
        assert_eq!(codec().validate(&token), Ok(id));
    }

    #[test]
    fn claims_carry_issuer_and_window() {
        let id = Uuid::new_v4();
        let at = Utc::now();
        let token = codec().issue_at(id, at, Duration::from_secs(90)).unwrap();
        let claims = codec().decode_claims(&token).unwrap();
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.iat, at.timestamp());
        assert_eq!(claims.exp - claims.iat, 90);
    }

    #[test]
    fn past_window_is_expired() {
        let id = Uuid::new_v4();
        let issued = Utc::now() - ChronoDuration::hours(2);
        let token = codec()
            .issue_at(id, issued, Duration::from_secs(3600))
            .unwrap();
        assert_eq!(codec().validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn other_secret_is_bad_signature() {
        let other = SessionTokenCodec::new(b"some-other-secret-some-other-secret", Duration::from_secs(60));
        let token = other.issue_default(Uuid::new_v4()).unwrap();
        assert_eq!(codec().validate(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            codec().validate("not-a-token"),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(codec().validate(""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn non_uuid_subject_is_unknown_subject() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: TOKEN_ISSUER.into(),
            sub: "alice".into(),
            iat: now,
            exp: now + 60,
        };
        let token = sign_raw(&claims, SECRET);
        assert_eq!(
            codec().validate(&token),
            Err(TokenError::UnknownSubject("alice".into()))
        );
    }

    #[test]
    fn foreign_issuer_is_malformed() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: "someone-else".into(),
            sub: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + 60,
        };
        let token = sign_raw(&claims, SECRET);
        assert!(matches!(
            codec().validate(&token),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn tampered_payload_is_bad_signature() {
        let token = codec().issue_default(Uuid::new_v4()).unwrap();
        let other = codec().issue_default(Uuid::new_v4()).unwrap();
        // header.payload.signature: splice a different payload under the old signature
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);
        assert_eq!(codec().validate(&spliced), Err(TokenError::BadSignature));
    }
}
