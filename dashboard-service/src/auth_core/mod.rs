//! Auth Core (spec §4.3): the hardest subsystem. Composes four pieces --
//! the client registry, session tokens, per-request signatures and the
//! nonce ledger -- into two checks every protected handler relies on:
//! "is this a validly signed request" and "does this bearer token name a
//! session belonging to the calling client".

pub mod nonce;
pub mod rate_limit;
pub mod registry;
pub mod session;
pub mod signature;

use crate::config::AuthConfig;
use crate::error::{Error, Result};

pub use nonce::NonceLedger;
pub use rate_limit::{Category, RateLimiters};
pub use registry::ClientRegistry;
pub use session::{SessionClaims, SessionTokens};
pub use signature::SignedRequestParts;

pub struct AuthCore {
    pub registry: ClientRegistry,
    pub sessions: SessionTokens,
    pub nonces: NonceLedger,
    pub rate_limits: RateLimiters,
    timestamp_window_secs: i64,
    min_nonce_len: usize,
}

impl AuthCore {
    pub fn new(config: &AuthConfig, rate_limit: &crate::config::RateLimitConfig) -> Result<Self> {
        let registry = ClientRegistry::new(config.clients.clone())?;
        Ok(Self {
            registry,
            sessions: SessionTokens::new(config.session_secret.clone(), config.session_ttl_secs, config.leeway_secs),
            nonces: NonceLedger::new(config.nonce_capacity, config.nonce_ttl()),
            rate_limits: RateLimiters::new(rate_limit),
            timestamp_window_secs: config.timestamp_window_secs,
            min_nonce_len: config.min_nonce_len,
        })
    }

    /// Five-step ordered verification of a signed request (spec §4.3.3):
    /// 1. headers present, 2. client known, 3. timestamp within window,
    /// 4. nonce unseen (recorded here, before step 5), 5. signature valid.
    pub async fn verify_signed_request(&self, client_id: &str, parts: &SignedRequestParts<'_>, signature: &str) -> Result<()> {
        if client_id.is_empty() || parts.timestamp.is_empty() || parts.nonce.is_empty() || signature.is_empty() {
            return Err(Error::MissingHeaders);
        }
        if parts.nonce.len() < self.min_nonce_len {
            return Err(Error::MissingHeaders);
        }

        let secret = self.registry.secret_for(client_id).ok_or(Error::UnknownClient)?;

        let requested_at: i64 = parts
            .timestamp
            .parse()
            .map_err(|_| Error::StaleRequest)?;
        let now = chrono::Utc::now().timestamp();
        if (now - requested_at).abs() > self.timestamp_window_secs {
            return Err(Error::StaleRequest);
        }

        if !self.nonces.check_and_insert(parts.nonce).await {
            return Err(Error::ReplayedNonce);
        }

        if !signature::verify(secret, parts, signature) {
            return Err(Error::BadSignature);
        }

        Ok(())
    }

    /// Validate a bearer session token and assert it was issued to
    /// `expected_client_id` (spec §4.3.5's `bearer.client_id == X-Client-Id`
    /// check on protected endpoints).
    pub fn verify_session(&self, bearer: &str, expected_client_id: &str) -> Result<SessionClaims> {
        let claims = self.sessions.verify(bearer)?;
        if claims.client_id != expected_client_id {
            return Err(Error::ClientMismatch);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn auth_config() -> AuthConfig {
        let mut clients = HashMap::new();
        clients.insert("desktop-main".to_string(), "client-secret".to_string());
        AuthConfig {
            session_secret: "s3ss10n".to_string(),
            clients,
            session_ttl_secs: 1200,
            leeway_secs: 120,
            timestamp_window_secs: 60,
            nonce_capacity: 10_000,
            nonce_ttl_secs: 300,
            min_nonce_len: 16,
        }
    }

    #[tokio::test]
    async fn accepts_a_correctly_signed_request() {
        let rate = crate::config::RateLimitConfig { login_rpm: 10, read_rpm: 60, write_rpm: 30 };
        let core = AuthCore::new(&auth_config(), &rate).unwrap();
        let now = chrono::Utc::now().timestamp().to_string();
        let parts = SignedRequestParts {
            method: "GET",
            path: "/api/watchlist",
            body: b"",
            timestamp: &now,
            nonce: "0123456789abcdef0123",
        };
        let signature = signature::sign("client-secret", &parts);
        assert!(core.verify_signed_request("desktop-main", &parts, &signature).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_replayed_nonce() {
        let rate = crate::config::RateLimitConfig { login_rpm: 10, read_rpm: 60, write_rpm: 30 };
        let core = AuthCore::new(&auth_config(), &rate).unwrap();
        let now = chrono::Utc::now().timestamp().to_string();
        let parts = SignedRequestParts {
            method: "GET",
            path: "/api/watchlist",
            body: b"",
            timestamp: &now,
            nonce: "0123456789abcdef0123",
        };
        let signature = signature::sign("client-secret", &parts);
        assert!(core.verify_signed_request("desktop-main", &parts, &signature).await.is_ok());
        assert!(matches!(
            core.verify_signed_request("desktop-main", &parts, &signature).await,
            Err(Error::ReplayedNonce)
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_client() {
        let rate = crate::config::RateLimitConfig { login_rpm: 10, read_rpm: 60, write_rpm: 30 };
        let core = AuthCore::new(&auth_config(), &rate).unwrap();
        let now = chrono::Utc::now().timestamp().to_string();
        let parts = SignedRequestParts {
            method: "GET",
            path: "/api/watchlist",
            body: b"",
            timestamp: &now,
            nonce: "0123456789abcdef0123",
        };
        let signature = signature::sign("client-secret", &parts);
        assert!(matches!(
            core.verify_signed_request("nope", &parts, &signature).await,
            Err(Error::UnknownClient)
        ));
    }

    #[test]
    fn session_client_mismatch_is_rejected() {
        let rate = crate::config::RateLimitConfig { login_rpm: 10, read_rpm: 60, write_rpm: 30 };
        let core = AuthCore::new(&auth_config(), &rate).unwrap();
        let token = core.sessions.issue("player-1", "desktop-main").unwrap();
        assert!(matches!(
            core.verify_session(&token, "other-client"),
            Err(Error::ClientMismatch)
        ));
    }
}
