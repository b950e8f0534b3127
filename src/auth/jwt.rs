use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{config::JwtConfig, error::ApiError, state::AppState};

/// Bearer-token payload: everything a product handler needs to stamp
/// ownership, so no user lookup happens per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig { secret, ttl_days } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs((ttl_days as u64) * 24 * 60 * 60),
        }
    }
}

impl JwtKeys {
    pub fn sign(&self, user_id: Uuid, email: &str, name: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            name: name.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Validity is fully determined by signature and expiry; callers treat
    /// `None` as unauthenticated without learning why verification failed.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => {
                debug!(user_id = %data.claims.sub, "jwt verified");
                Some(data.claims)
            }
            Err(_) => None,
        }
    }
}

/// Extractor gating every product route: rejects with a generic 401 before
/// the handler runs.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let unauthorized = || ApiError::Unauthorized("Unauthorized".to_string());

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(unauthorized)?;

        match keys.verify(token) {
            Some(claims) => Ok(AuthUser(claims)),
            None => {
                warn!("invalid or expired token");
                Err(unauthorized())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRef;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    #[tokio::test]
    async fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, "a@x.com", "A").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.name, "A");
    }

    #[tokio::test]
    async fn expiry_is_seven_days_out() {
        let keys = make_keys();
        let token = keys.sign(Uuid::new_v4(), "a@x.com", "A").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, 7 * 24 * 60 * 60);
    }

    #[tokio::test]
    async fn verify_rejects_garbage_and_tampering() {
        let keys = make_keys();
        assert!(keys.verify("not-a-token").is_none());

        let token = keys.sign(Uuid::new_v4(), "a@x.com", "A").expect("sign");
        let parts: Vec<&str> = token.split('.').collect();
        let payload = parts[1];
        let mid = payload.len() / 2;
        let flipped = if payload.as_bytes()[mid] == b'A' { "B" } else { "A" };
        let tampered_payload = format!("{}{}{}", &payload[..mid], flipped, &payload[mid + 1..]);
        let tampered = format!("{}.{}.{}", parts[0], tampered_payload, parts[2]);
        assert!(keys.verify(&tampered).is_none());
    }

    #[tokio::test]
    async fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let token = keys.sign(Uuid::new_v4(), "a@x.com", "A").expect("sign");

        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            ttl: Duration::from_secs(60),
        };
        assert!(other.verify(&token).is_none());
    }

    #[tokio::test]
    async fn verify_rejects_expired_token() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        // Expired well past the default validation leeway.
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@x.com".into(),
            name: "A".into(),
            iat: now - 8 * 24 * 60 * 60,
            exp: now - 24 * 60 * 60,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_none());
    }
}
