//! Deals provider: OAuth2 client-credentials token caching plus best-deals
//! and per-game deal lookups.
//!
//! The access token is cached until `expires_at - 30s` and refreshed
//! single-flight: refresh holds the token mutex across the await, so
//! concurrent callers that arrive mid-refresh simply wait for the same
//! in-flight request instead of each firing their own (spec §4.2).

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::UpstreamConfig;
use crate::error::{Error, Result};

use super::http_client::send_with_retry;

/// Safety margin subtracted from the token's reported expiry before it is
/// considered stale, so a token is never used right at the edge of expiry.
const EXPIRY_SAFETY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct DealsClient {
    http: Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    token_url: Option<String>,
    api_base: Option<String>,
    token: Arc<Mutex<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub appid: i64,
    pub title: String,
    pub sale_price: f64,
    pub normal_price: f64,
    pub store: String,
}

impl DealsClient {
    pub fn new(http: Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            client_id: config.deals_client_id.clone(),
            client_secret: config.deals_client_secret.clone(),
            token_url: config.deals_token_url.clone(),
            api_base: config.deals_api_base.clone(),
            token: Arc::new(Mutex::new(None)),
        }
    }

    fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.token_url.is_some()
    }

    async fn access_token(&self) -> Result<String> {
        if !self.is_configured() {
            return Err(Error::Config(
                "upstream deals provider credentials are not configured".to_string(),
            ));
        }

        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let client_id = self.client_id.as_deref().expect("checked by is_configured");
        let client_secret = self
            .client_secret
            .as_deref()
            .expect("checked by is_configured");
        let token_url = self.token_url.as_deref().expect("checked by is_configured");

        let http = self.http.clone();
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];
        let resp = send_with_retry("deals.token", || http.post(token_url).form(&params).send()).await?;

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("deals token decode failed: {e}")))?;

        let ttl = Duration::from_secs(body.expires_in).saturating_sub(EXPIRY_SAFETY_MARGIN);
        let cached = CachedToken {
            access_token: body.access_token.clone(),
            expires_at: Instant::now() + ttl,
        };
        *guard = Some(cached);
        Ok(body.access_token)
    }

    /// `get_best_deals(limit, min_discount_pct)` (spec §4.2): the `limit`
    /// and `min_discount_pct` are passed straight through as upstream query
    /// parameters, not applied client-side, so the upstream does the
    /// filtering/pagination work.
    pub async fn best_deals(&self, limit: u32, min_discount_pct: u32) -> Result<Vec<Deal>> {
        let api_base = self
            .api_base
            .as_deref()
            .ok_or_else(|| Error::Config("upstream.deals_api_base is not configured".to_string()))?;
        let token = self.access_token().await?;
        let url = format!(
            "{api_base}/deals/best?limit={limit}&min_discount={min_discount_pct}"
        );
        let http = self.http.clone();
        let resp = send_with_retry("deals.best", || {
            http.get(&url).bearer_auth(&token).send()
        })
        .await?;
        resp.json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("deals decode failed: {e}")))
    }

    /// `get_game_prices(appid)` (spec §4.2).
    pub async fn deals_for_game(&self, appid: i64) -> Result<Vec<Deal>> {
        let api_base = self
            .api_base
            .as_deref()
            .ok_or_else(|| Error::Config("upstream.deals_api_base is not configured".to_string()))?;
        let token = self.access_token().await?;
        let url = format!("{api_base}/deals/game/{appid}");
        let http = self.http.clone();
        let resp = send_with_retry("deals.game", || {
            http.get(&url).bearer_auth(&token).send()
        })
        .await?;

        if resp.status().is_client_error() {
            return Ok(Vec::new());
        }
        resp.json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("deals decode failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_errors_without_network_call() {
        let client = DealsClient::new(Client::new(), &UpstreamConfig::default());
        let err = client.access_token().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
