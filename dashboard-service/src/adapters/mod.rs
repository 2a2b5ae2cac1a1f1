//! Upstream Adapters (spec §4.2): typed clients for the Steam-facing
//! providers, sharing one `reqwest::Client` and a common retry/fan-out
//! policy.

pub mod catalog;
pub mod deals;
pub mod fanout;
pub mod http_client;
pub mod player_count;
pub mod user;

use crate::config::UpstreamConfig;
use crate::error::Result;
use crate::storage::GameDetails;

pub use catalog::CatalogClient;
pub use deals::{Deal, DealsClient};
pub use player_count::PlayerCountClient;
pub use user::{OwnedGame, UserClient};

/// Bundles the four upstream clients behind the shared transport.
#[derive(Clone)]
pub struct Adapters {
    pub player_count: PlayerCountClient,
    pub catalog: CatalogClient,
    pub user: UserClient,
    pub deals: DealsClient,
    fanout_limit: usize,
}

impl Adapters {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http = http_client::build_client(config.http_timeout_secs)?;
        Ok(Self {
            player_count: PlayerCountClient::new(http.clone(), config),
            catalog: CatalogClient::new(http.clone(), config),
            user: UserClient::new(http.clone(), config),
            deals: DealsClient::new(http, config),
            fanout_limit: config.fanout_limit,
        })
    }

    /// Sample current player counts for every watchlisted appid, bounded to
    /// `fanout_limit` concurrent requests. Per-appid failures are logged and
    /// omitted (spec §4.2, §4.5 sampling job).
    pub async fn sample_player_counts(&self, appids: Vec<i64>) -> Vec<(i64, i64)> {
        let client = self.player_count.clone();
        fanout::bounded(appids, self.fanout_limit, move |appid| {
            let client = client.clone();
            async move { client.current_players(appid).await.map(|count| (appid, count)) }
        })
        .await
    }

    /// Enrich catalog metadata for a batch of appids, bounded the same way.
    pub async fn enrich_catalog(&self, appids: Vec<i64>) -> Vec<GameDetails> {
        let client = self.catalog.clone();
        fanout::bounded(appids, self.fanout_limit, move |appid| {
            let client = client.clone();
            async move { client.fetch(appid).await }
        })
        .await
    }
}
