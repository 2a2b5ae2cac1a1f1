//! Catalog (app details) provider: title, price, images, description, tags.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use crate::storage::GameDetails;

use super::http_client::send_with_retry;

const DEFAULT_API_BASE: &str = "https://store.steampowered.com/api/appdetails";
const MOST_PLAYED_URL: &str = "https://api.steampowered.com/ISteamChartsService/GetMostPlayedGames/v1";
const FEATURED_CATEGORIES_URL: &str = "https://store.steampowered.com/api/featuredcategories";

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct MostPlayedEntry {
    pub appid: i64,
    pub name: String,
    pub current_players: i64,
}

#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct ComingSoonEntry {
    pub appid: i64,
    pub name: String,
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MostPlayedResponse {
    response: MostPlayedBody,
}

#[derive(Debug, Default, Deserialize)]
struct MostPlayedBody {
    #[serde(default)]
    ranks: Vec<MostPlayedRank>,
}

#[derive(Debug, Deserialize)]
struct MostPlayedRank {
    appid: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    concurrent_in_game: i64,
}

#[derive(Debug, Deserialize)]
struct FeaturedCategoriesResponse {
    coming_soon: Option<FeaturedCategory>,
}

#[derive(Debug, Default, Deserialize)]
struct FeaturedCategory {
    #[serde(default)]
    items: Vec<FeaturedItem>,
}

#[derive(Debug, Deserialize)]
struct FeaturedItem {
    id: i64,
    name: String,
    #[serde(default)]
    release_date: Option<String>,
}

#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct AppDetailsEntry {
    success: bool,
    data: Option<AppDetailsData>,
}

#[derive(Debug, Deserialize)]
struct AppDetailsData {
    name: String,
    #[serde(default)]
    is_free: bool,
    #[serde(default)]
    price_overview: Option<PriceOverview>,
    #[serde(default)]
    release_date: Option<ReleaseDate>,
    #[serde(default)]
    header_image: Option<String>,
    #[serde(default)]
    background: Option<String>,
    #[serde(default)]
    detailed_description: Option<String>,
    #[serde(default)]
    genres: Vec<NamedTag>,
    #[serde(default)]
    categories: Vec<NamedTag>,
}

#[derive(Debug, Deserialize)]
struct PriceOverview {
    #[serde(rename = "final")]
    final_cents: i64,
}

#[derive(Debug, Deserialize)]
struct ReleaseDate {
    #[serde(default)]
    coming_soon: bool,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedTag {
    description: String,
}

/// Small fixed options record for the catalog call's dynamic named
/// parameters (spec §9: country/language map to an explicit options
/// record rather than free-form dynamic arguments).
#[derive(Debug, Clone)]
pub struct AppDetailsOptions {
    pub country: String,
    pub language: String,
}

impl Default for AppDetailsOptions {
    fn default() -> Self {
        Self {
            country: "us".to_string(),
            language: "english".to_string(),
        }
    }
}

impl CatalogClient {
    pub fn new(http: Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            api_base: config
                .catalog_api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }

    pub async fn fetch(&self, appid: i64) -> Result<GameDetails> {
        self.fetch_with_options(appid, &AppDetailsOptions::default()).await
    }

    pub async fn fetch_with_options(&self, appid: i64, options: &AppDetailsOptions) -> Result<GameDetails> {
        let url = format!(
            "{}?appids={appid}&cc={}&l={}",
            self.api_base, options.country, options.language
        );
        let http = self.http.clone();
        let resp = send_with_retry("catalog", || http.get(&url).send()).await?;

        if resp.status().is_client_error() {
            return Err(Error::NotFound(format!("game {appid}")));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("catalog decode failed: {e}")))?;

        let entry: AppDetailsEntry = serde_json::from_value(
            body.get(appid.to_string())
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("game {appid}")))?,
        )
        .map_err(|e| Error::UpstreamUnavailable(format!("catalog decode failed: {e}")))?;

        if !entry.success {
            return Err(Error::NotFound(format!("game {appid}")));
        }
        let data = entry.data.ok_or_else(|| Error::NotFound(format!("game {appid}")))?;

        Ok(GameDetails {
            appid,
            name: data.name,
            is_free: data.is_free,
            price: data
                .price_overview
                .map(|p| p.final_cents as f64 / 100.0)
                .unwrap_or(0.0),
            release_date: data.release_date.as_ref().and_then(|r| r.date.clone()),
            coming_soon: data.release_date.map(|r| r.coming_soon).unwrap_or(false),
            header_image: data.header_image,
            background_image: data.background,
            detailed_description: data.detailed_description.as_deref().map(strip_html),
            genres: data.genres.into_iter().map(|g| g.description).collect(),
            categories: data.categories.into_iter().map(|c| c.description).collect(),
        })
    }

    /// Top-`n` most-played titles by current concurrent players. Used by
    /// the watchlist-refresh scheduler job and `GET /api/steam/most-played`.
    pub async fn get_most_played_top_n(&self, n: usize) -> Result<Vec<MostPlayedEntry>> {
        let http = self.http.clone();
        let resp = send_with_retry("catalog.most_played", || http.get(MOST_PLAYED_URL).send()).await?;
        let body: MostPlayedResponse = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("most-played decode failed: {e}")))?;

        Ok(body
            .response
            .ranks
            .into_iter()
            .take(n)
            .map(|rank| MostPlayedEntry {
                appid: rank.appid,
                name: rank.name.unwrap_or_else(|| format!("app {}", rank.appid)),
                current_players: rank.concurrent_in_game,
            })
            .collect())
    }

    /// Titles flagged as not-yet-released by the storefront's featured
    /// categories feed. Used by `GET /api/steam/coming-soon` and the
    /// watchlist/backfill jobs.
    pub async fn get_coming_soon(&self) -> Result<Vec<ComingSoonEntry>> {
        let http = self.http.clone();
        let resp = send_with_retry("catalog.coming_soon", || {
            http.get(FEATURED_CATEGORIES_URL).send()
        })
        .await?;
        let body: FeaturedCategoriesResponse = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("coming-soon decode failed: {e}")))?;

        Ok(body
            .coming_soon
            .map(|category| {
                category
                    .items
                    .into_iter()
                    .map(|item| ComingSoonEntry {
                        appid: item.id,
                        name: item.name,
                        release_date: item.release_date,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Strip HTML tags from a Steam store description, collapsing the
/// whitespace left behind.
fn strip_html(input: &str) -> String {
    let without_tags = HTML_TAG.replace_all(input, " ");
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let input = "<p>A <b>great</b>   game.</p><br/>Buy it.";
        assert_eq!(strip_html(input), "A great game. Buy it.");
    }
}
