//! Session tokens: HMAC-SHA256-signed claims (spec §4.3.2).
//!
//! Built on `jsonwebtoken`'s HS256 support, which already performs a
//! constant-time MAC comparison on decode. `leeway` absorbs clock skew on
//! the expiry check only -- issuance always stamps the real `iat`/`exp`.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const TOKEN_TYPE: &str = "access";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub client_id: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: String,
}

#[derive(Clone)]
pub struct SessionTokens {
    secret: String,
    ttl_secs: i64,
    leeway_secs: i64,
}

impl SessionTokens {
    pub fn new(secret: impl Into<String>, ttl_secs: i64, leeway_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
            leeway_secs,
        }
    }

    /// Issue a session token for `subject` scoped to `client_id`.
    pub fn issue(&self, subject: &str, client_id: &str) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: subject.to_string(),
            client_id: client_id.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
            token_type: TOKEN_TYPE.to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| Error::Internal(format!("failed to sign session token: {e}")))
    }

    /// Verify and decode a bearer token. Rejects expired tokens (beyond
    /// `leeway_secs`) and anything that fails MAC verification.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_secs.max(0) as u64;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| Error::InvalidSession)?;

        if data.claims.token_type != TOKEN_TYPE {
            return Err(Error::InvalidSession);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_valid_token() {
        let tokens = SessionTokens::new("s3cr3t", 1200, 120);
        let token = tokens.issue("player-1", "desktop-main").unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "player-1");
        assert_eq!(claims.client_id, "desktop-main");
    }

    #[test]
    fn rejects_tampered_secret() {
        let issuer = SessionTokens::new("s3cr3t", 1200, 120);
        let token = issuer.issue("player-1", "desktop-main").unwrap();
        let verifier = SessionTokens::new("different-secret", 1200, 120);
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn rejects_expired_token_beyond_leeway() {
        let tokens = SessionTokens::new("s3cr3t", -10, 0);
        let token = tokens.issue("player-1", "desktop-main").unwrap();
        assert!(matches!(tokens.verify(&token), Err(Error::InvalidSession)));
    }
}
