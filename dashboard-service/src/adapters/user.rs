//! User provider: steamid64 / vanity URL resolution and owned-game lookups.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::UpstreamConfig;
use crate::error::{Error, Result};

use super::http_client::send_with_retry;

const RESOLVE_VANITY_URL: &str = "https://api.steampowered.com/ISteamUser/ResolveVanityURL/v1";
const OWNED_GAMES_URL: &str = "https://api.steampowered.com/IPlayerService/GetOwnedGames/v1";
const RECENTLY_PLAYED_URL: &str = "https://api.steampowered.com/IPlayerService/GetRecentlyPlayedGames/v1";
const PLAYER_SUMMARY_URL: &str = "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v2";
const BADGES_URL: &str = "https://api.steampowered.com/IPlayerService/GetBadges/v1";

#[derive(Clone)]
pub struct UserClient {
    http: Client,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedGame {
    pub appid: i64,
    pub playtime_forever_minutes: i64,
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    response: ResolveBody,
}

#[derive(Debug, Deserialize)]
struct ResolveBody {
    success: i32,
    steamid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwnedGamesResponse {
    response: OwnedGamesBody,
}

#[derive(Debug, Default, Deserialize)]
struct OwnedGamesBody {
    #[serde(default)]
    games: Vec<RawOwnedGame>,
}

#[derive(Debug, Deserialize)]
struct RawOwnedGame {
    appid: i64,
    #[serde(default)]
    playtime_forever: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentGame {
    pub appid: i64,
    pub name: String,
    pub playtime_2weeks_minutes: i64,
}

#[derive(Debug, Deserialize)]
struct RecentlyPlayedResponse {
    response: RecentlyPlayedBody,
}

#[derive(Debug, Default, Deserialize)]
struct RecentlyPlayedBody {
    #[serde(default)]
    games: Vec<RawRecentGame>,
}

#[derive(Debug, Deserialize)]
struct RawRecentGame {
    appid: i64,
    name: String,
    #[serde(default)]
    playtime_2weeks: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub steamid: String,
    pub persona_name: String,
    pub profile_url: String,
    pub avatar_full: String,
    pub visibility_state: i32,
}

#[derive(Debug, Deserialize)]
struct PlayerSummaryResponse {
    response: PlayerSummaryBody,
}

#[derive(Debug, Default, Deserialize)]
struct PlayerSummaryBody {
    #[serde(default)]
    players: Vec<RawPlayerSummary>,
}

#[derive(Debug, Deserialize)]
struct RawPlayerSummary {
    steamid: String,
    personaname: String,
    profileurl: String,
    avatarfull: String,
    communityvisibilitystate: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub badgeid: i32,
    pub level: i32,
    pub xp: i64,
}

#[derive(Debug, Deserialize)]
struct BadgesResponse {
    response: BadgesBody,
}

#[derive(Debug, Default, Deserialize)]
struct BadgesBody {
    #[serde(default)]
    badges: Vec<RawBadge>,
}

#[derive(Debug, Deserialize)]
struct RawBadge {
    badgeid: i32,
    #[serde(default)]
    level: i32,
    #[serde(default)]
    xp: i64,
}

impl UserClient {
    pub fn new(http: Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            api_key: config.player_api_key.clone(),
        }
    }

    fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Config("upstream.player_api_key is not configured".to_string()))
    }

    /// Resolve a Steam Community vanity name to a steamid64. Returns `None`
    /// if the upstream reports no match (not an error -- the caller decides
    /// whether that is a 404).
    pub async fn resolve_vanity(&self, vanity: &str) -> Result<Option<String>> {
        let key = self.require_api_key()?;
        let url = format!("{RESOLVE_VANITY_URL}?key={key}&vanityurl={vanity}");
        let http = self.http.clone();
        let resp = send_with_retry("user.resolve_vanity", || http.get(&url).send()).await?;
        let body: ResolveResponse = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("vanity resolve decode failed: {e}")))?;

        if body.response.success == 1 {
            Ok(body.response.steamid)
        } else {
            Ok(None)
        }
    }

    pub async fn owned_games(&self, steamid64: &str) -> Result<Vec<OwnedGame>> {
        let key = self.require_api_key()?;
        let url = format!(
            "{OWNED_GAMES_URL}?key={key}&steamid={steamid64}&include_appinfo=false"
        );
        let http = self.http.clone();
        let resp = send_with_retry("user.owned_games", || http.get(&url).send()).await?;
        let body: OwnedGamesResponse = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("owned games decode failed: {e}")))?;

        Ok(body
            .response
            .games
            .into_iter()
            .map(|g| OwnedGame {
                appid: g.appid,
                playtime_forever_minutes: g.playtime_forever,
            })
            .collect())
    }

    pub async fn recently_played(&self, steamid64: &str) -> Result<Vec<RecentGame>> {
        let key = self.require_api_key()?;
        let url = format!("{RECENTLY_PLAYED_URL}?key={key}&steamid={steamid64}");
        let http = self.http.clone();
        let resp = send_with_retry("user.recently_played", || http.get(&url).send()).await?;
        let body: RecentlyPlayedResponse = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("recently played decode failed: {e}")))?;

        Ok(body
            .response
            .games
            .into_iter()
            .map(|g| RecentGame {
                appid: g.appid,
                name: g.name,
                playtime_2weeks_minutes: g.playtime_2weeks,
            })
            .collect())
    }

    pub async fn player_summary(&self, steamid64: &str) -> Result<Option<PlayerSummary>> {
        let key = self.require_api_key()?;
        let url = format!("{PLAYER_SUMMARY_URL}?key={key}&steamids={steamid64}");
        let http = self.http.clone();
        let resp = send_with_retry("user.player_summary", || http.get(&url).send()).await?;
        let body: PlayerSummaryResponse = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("player summary decode failed: {e}")))?;

        Ok(body.response.players.into_iter().next().map(|p| PlayerSummary {
            steamid: p.steamid,
            persona_name: p.personaname,
            profile_url: p.profileurl,
            avatar_full: p.avatarfull,
            visibility_state: p.communityvisibilitystate,
        }))
    }

    pub async fn badges(&self, steamid64: &str) -> Result<Vec<Badge>> {
        let key = self.require_api_key()?;
        let url = format!("{BADGES_URL}?key={key}&steamid={steamid64}");
        let http = self.http.clone();
        let resp = send_with_retry("user.badges", || http.get(&url).send()).await?;
        let body: BadgesResponse = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("badges decode failed: {e}")))?;

        Ok(body
            .response
            .badges
            .into_iter()
            .map(|b| Badge {
                badgeid: b.badgeid,
                level: b.level,
                xp: b.xp,
            })
            .collect())
    }
}
