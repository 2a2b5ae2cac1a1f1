//! Steam-facing read endpoints: most-played, coming-soon, and per-player
//! lookups (spec §4.6, §6).

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::adapters::catalog::{ComingSoonEntry, MostPlayedEntry};
use crate::adapters::user::{Badge, OwnedGame, PlayerSummary, RecentGame};
use crate::error::{Error, Result};
use crate::state::AppState;
use crate::validation::{parse_steamid, SteamIdInput};

#[derive(Debug, Serialize)]
pub struct MostPlayedResponse {
    pub games: Vec<MostPlayedEntry>,
}

pub async fn most_played(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let n = state.config.scheduler.watchlist_top_n;
    let games = state.adapters.catalog.get_most_played_top_n(n).await?;
    Ok(Json(MostPlayedResponse { games }))
}

#[derive(Debug, Serialize)]
pub struct ComingSoonResponse {
    pub games: Vec<ComingSoonEntry>,
}

pub async fn coming_soon(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let games = state.adapters.catalog.get_coming_soon().await?;
    Ok(Json(ComingSoonResponse { games }))
}

/// Resolve the `{steamid}` path segment -- a steamid64, a vanity name, or a
/// community URL wrapping either -- down to a concrete steamid64, resolving
/// vanity names through the user adapter (spec §6).
async fn resolve_steamid(state: &AppState, raw: &str) -> Result<String> {
    match parse_steamid(raw)? {
        SteamIdInput::Id64(id) => Ok(id),
        SteamIdInput::Vanity(vanity) => state
            .adapters
            .user
            .resolve_vanity(&vanity)
            .await?
            .ok_or_else(|| Error::NotFound(format!("steam user '{vanity}'"))),
    }
}

#[derive(Debug, Serialize)]
pub struct OwnedGamesResponse {
    pub games: Vec<OwnedGame>,
}

pub async fn owned_games(State(state): State<AppState>, Path(steamid): Path<String>) -> Result<impl IntoResponse> {
    let steamid64 = resolve_steamid(&state, &steamid).await?;
    let games = state.adapters.user.owned_games(&steamid64).await?;
    Ok(Json(OwnedGamesResponse { games }))
}

#[derive(Debug, Serialize)]
pub struct RecentlyPlayedResponse {
    pub games: Vec<RecentGame>,
}

pub async fn recently_played(State(state): State<AppState>, Path(steamid): Path<String>) -> Result<impl IntoResponse> {
    let steamid64 = resolve_steamid(&state, &steamid).await?;
    let games = state.adapters.user.recently_played(&steamid64).await?;
    Ok(Json(RecentlyPlayedResponse { games }))
}

pub async fn player_summary(State(state): State<AppState>, Path(steamid): Path<String>) -> Result<impl IntoResponse> {
    let steamid64 = resolve_steamid(&state, &steamid).await?;
    let summary: PlayerSummary = state
        .adapters
        .user
        .player_summary(&steamid64)
        .await?
        .ok_or_else(|| Error::NotFound(format!("steam user '{steamid}'")))?;
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
pub struct BadgesResponse {
    pub badges: Vec<Badge>,
}

pub async fn badges(State(state): State<AppState>, Path(steamid): Path<String>) -> Result<impl IntoResponse> {
    let steamid64 = resolve_steamid(&state, &steamid).await?;
    let badges = state.adapters.user.badges(&steamid64).await?;
    Ok(Json(BadgesResponse { badges }))
}
