use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{config::SessionConfig, state::AppState};

/// Signed session claims carried by the cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub open_id: String,
    pub app_id: String,
    pub name: String,
    pub exp: usize, // epoch seconds
}

/// A verified session identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub open_id: String,
    pub app_id: String,
    pub name: String,
}

/// Holds signing and verification keys with session config data.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    app_id: String,
    ttl: TimeDuration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let SessionConfig {
            secret,
            app_id,
            ttl_days,
            ..
        } = state.config.session.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            app_id,
            ttl: TimeDuration::days(ttl_days),
        }
    }
}

impl SessionKeys {
    /// Mints a signed session token with the default one-year expiry.
    pub fn sign(&self, open_id: &str, name: &str) -> anyhow::Result<String> {
        self.sign_with_ttl(open_id, name, self.ttl)
    }

    pub fn sign_with_ttl(
        &self,
        open_id: &str,
        name: &str,
        ttl: TimeDuration,
    ) -> anyhow::Result<String> {
        let exp = OffsetDateTime::now_utc() + ttl;
        let claims = Claims {
            open_id: open_id.to_string(),
            app_id: self.app_id.clone(),
            name: name.to_string(),
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(open_id, "session signed");
        Ok(token)
    }

    /// Verifies a token, treating absence uniformly with invalid input:
    /// missing token, bad signature, expiry and malformed claims all yield
    /// `None` rather than an error.
    pub fn verify(&self, token: Option<&str>) -> Option<Session> {
        let token = token?;
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).ok()?;
        Some(Session {
            open_id: data.claims.open_id,
            app_id: data.claims.app_id,
            name: data.claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> SessionKeys {
        let state = AppState::fake();
        SessionKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_round_trip() {
        let keys = make_keys();
        let token = keys.sign("42", "Ann").expect("sign");
        let session = keys.verify(Some(&token)).expect("verify");
        assert_eq!(session.open_id, "42");
        assert_eq!(session.app_id, "telegram-miniapp");
        assert_eq!(session.name, "Ann");
    }

    #[tokio::test]
    async fn missing_token_is_no_session() {
        let keys = make_keys();
        assert_eq!(keys.verify(None), None);
    }

    #[tokio::test]
    async fn garbage_token_is_no_session() {
        let keys = make_keys();
        assert_eq!(keys.verify(Some("not-a-jwt")), None);
        assert_eq!(keys.verify(Some("")), None);
    }

    #[tokio::test]
    async fn tampered_token_is_no_session() {
        let keys = make_keys();
        let token = keys.sign("42", "Ann").expect("sign");
        // Corrupt the signature segment.
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert_eq!(keys.verify(Some(&tampered)), None);
    }

    #[tokio::test]
    async fn expired_token_is_no_session() {
        let keys = make_keys();
        // Well past the default 60s validation leeway.
        let token = keys
            .sign_with_ttl("42", "Ann", TimeDuration::seconds(-300))
            .expect("sign");
        assert_eq!(keys.verify(Some(&token)), None);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_no_session() {
        let keys = make_keys();
        let other = SessionKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            app_id: "telegram-miniapp".into(),
            ttl: TimeDuration::days(365),
        };
        let token = other.sign("42", "Ann").expect("sign");
        assert_eq!(keys.verify(Some(&token)), None);
    }
}
