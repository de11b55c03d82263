use std::time::Duration;

use chirpy::auth::{SessionTokenCodec, TokenError, TOKEN_ISSUER};
use chirpy::config::{generate_secret, Config};
use chrono::Utc;
use uuid::Uuid;

fn codec_from_config() -> SessionTokenCodec {
    let mut cfg = Config::default();
    cfg.auth.token_secret = generate_secret();
    cfg.auth.token_ttl_seconds = 120;
    SessionTokenCodec::from_config(&cfg.auth)
}

#[test]
fn default_lifetime_comes_from_config() {
    let codec = codec_from_config();
    assert_eq!(codec.default_ttl(), Duration::from_secs(120));

    let id = Uuid::new_v4();
    let token = codec.issue_default(id).unwrap();
    let claims = codec.decode_claims(&token).unwrap();
    assert_eq!(claims.iss, TOKEN_ISSUER);
    assert_eq!(claims.sub, id.to_string());
    assert_eq!(claims.exp - claims.iat, 120);
}

#[test]
fn tokens_do_not_cross_configs() {
    let a = codec_from_config();
    let b = codec_from_config();
    let token = a.issue_default(Uuid::new_v4()).unwrap();
    assert!(matches!(b.validate(&token), Err(TokenError::BadSignature)));
}

#[test]
fn window_boundaries() {
    let codec = codec_from_config();
    let id = Uuid::new_v4();

    // Issued an hour ago for ten minutes: gone.
    let stale = codec
        .issue_at(id, Utc::now() - chrono::Duration::hours(1), Duration::from_secs(600))
        .unwrap();
    assert!(matches!(codec.validate(&stale), Err(TokenError::Expired)));

    // Issued ten minutes ago for an hour: still good.
    let fresh = codec
        .issue_at(id, Utc::now() - chrono::Duration::minutes(10), Duration::from_secs(3600))
        .unwrap();
    assert_eq!(codec.validate(&fresh).unwrap(), id);
}

#[test]
fn validation_is_stateless() {
    let secret = generate_secret();
    let issuer = SessionTokenCodec::new(secret.as_bytes(), Duration::from_secs(60));
    let token = issuer.issue_default(Uuid::nil()).unwrap();
    drop(issuer);

    // A fresh codec with the same secret accepts it; nothing was remembered.
    let checker = SessionTokenCodec::new(secret.as_bytes(), Duration::from_secs(60));
    assert_eq!(checker.validate(&token).unwrap(), Uuid::nil());
    assert_eq!(checker.validate(&token).unwrap(), Uuid::nil());
}

#[test]
fn error_kinds_are_stable_labels() {
    let codec = codec_from_config();
    let err = codec.validate("not-a-token").unwrap_err();
    assert_eq!(err.kind(), "malformed");
}
