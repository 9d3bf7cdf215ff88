//! Signed session tokens.
//!
//! Tokens are compact JWTs signed with HS256 under the configured secret.
//! Verification never fails loudly: anything wrong with a token yields `None`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sitepulse_core::auth::{is_non_empty, SessionPayload};

use crate::config::AuthConfig;
use crate::error::AuthError;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionClaims {
    open_id: String,
    app_id: String,
    name: String,
    exp: i64,
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct TokenCodec {
    app_id: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str, app_id: impl Into<String>) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;

        Self {
            app_id: app_id.into(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.session_secret, config.app_id.clone())
    }

    /// Creates a session token for `open_id` under the configured app id.
    pub fn create_session_token(
        &self,
        open_id: &str,
        name: &str,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let payload = SessionPayload {
            open_id: open_id.to_string(),
            app_id: self.app_id.clone(),
            name: name.to_string(),
        };
        self.sign(&payload, ttl)
    }

    /// Signs `payload`, expiring `ttl` from now.
    pub fn sign(&self, payload: &SessionPayload, ttl: Duration) -> Result<String, AuthError> {
        let expires_at_ms = Utc::now().timestamp_millis() + ttl.num_milliseconds();
        let claims = SessionClaims {
            open_id: payload.open_id.clone(),
            app_id: payload.app_id.clone(),
            name: payload.name.clone(),
            exp: expires_at_ms.div_euclid(1000),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Token(e.to_string()))
    }

    /// Verifies a token, returning its payload when it is well-formed,
    /// correctly signed, unexpired and carries non-empty `openId` and `appId`.
    pub fn verify(&self, token: Option<&str>) -> Option<SessionPayload> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            tracing::warn!("Missing session cookie");
            return None;
        };

        let claims = match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::warn!(error = %e, "Session verification failed");
                return None;
            }
        };

        if claims.exp <= Utc::now().timestamp() {
            tracing::warn!("Session token expired");
            return None;
        }

        if !is_non_empty(&claims.open_id) || !is_non_empty(&claims.app_id) {
            tracing::warn!("Session payload missing required fields");
            return None;
        }

        Some(SessionPayload {
            open_id: claims.open_id,
            app_id: claims.app_id,
            name: claims.name,
        })
    }
}
