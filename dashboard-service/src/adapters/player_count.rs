//! Current-player-count provider.

use reqwest::Client;
use serde::Deserialize;

use crate::config::UpstreamConfig;
use crate::error::{Error, Result};

use super::http_client::send_with_retry;

const DEFAULT_API_BASE: &str = "https://api.steampowered.com/ISteamUserStats/GetNumberOfCurrentPlayers/v1";

#[derive(Clone)]
pub struct PlayerCountClient {
    http: Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    response: ApiResponseBody,
}

#[derive(Debug, Deserialize)]
struct ApiResponseBody {
    player_count: Option<i64>,
    result: i32,
}

impl PlayerCountClient {
    pub fn new(http: Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            api_base: config
                .player_count_api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }

    pub async fn current_players(&self, appid: i64) -> Result<i64> {
        let url = format!("{}?appid={appid}", self.api_base);
        let http = self.http.clone();
        let resp = send_with_retry("player_count", || http.get(&url).send()).await?;

        if resp.status().is_client_error() {
            return Err(Error::UpstreamUnavailable(format!(
                "player count provider rejected appid {appid}: {}",
                resp.status()
            )));
        }

        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("player count decode failed: {e}")))?;

        if body.response.result != 1 {
            return Err(Error::UpstreamUnavailable(format!(
                "player count provider returned result={}",
                body.response.result
            )));
        }

        Ok(body.response.player_count.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_steam_api_base() {
        let client = PlayerCountClient::new(Client::new(), &UpstreamConfig::default());
        assert_eq!(client.api_base, DEFAULT_API_BASE);
    }
}
