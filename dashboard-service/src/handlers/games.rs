//! Game catalog endpoints (spec §4.6, §6).

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::AppState;
use crate::storage::GameDetails;
use crate::validation::{validate_appid, validate_tags_batch};

#[derive(Debug, Serialize)]
pub struct GamesResponse {
    pub games: Vec<GameDetails>,
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let games = state.storage.get_all_games().await?;
    Ok(Json(GamesResponse { games }))
}

pub async fn get(State(state): State<AppState>, Path(appid): Path<i64>) -> Result<impl IntoResponse> {
    let appid = validate_appid(appid)?;
    let game = state
        .storage
        .get_game(appid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("game {appid}")))?;
    Ok(Json(game))
}

#[derive(Debug, Serialize)]
pub struct CurrentPlayersResponse {
    pub appid: i64,
    pub current_players: i64,
    pub source: &'static str,
}

/// Prefers a live read from the player-count adapter; falls back to the
/// watchlist's last sampled count on upstream failure, and only surfaces a
/// 503 when neither is available (spec §7: transient upstream failure
/// returns cached data, not a hard error, when cached data exists).
pub async fn current_players(
    State(state): State<AppState>,
    Path(appid): Path<i64>,
) -> Result<impl IntoResponse> {
    let appid = validate_appid(appid)?;

    match state.adapters.player_count.current_players(appid).await {
        Ok(count) => Ok(Json(CurrentPlayersResponse {
            appid,
            current_players: count,
            source: "live",
        })),
        Err(live_err) => {
            let watchlist = state.storage.get_watchlist().await?;
            match watchlist.into_iter().find(|w| w.appid == appid) {
                Some(entry) => Ok(Json(CurrentPlayersResponse {
                    appid,
                    current_players: entry.last_count,
                    source: "cached",
                })),
                None => Err(live_err),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TagsBatchRequest {
    pub appids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct GameTags {
    pub genres: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TagsBatchResponse {
    pub tags: HashMap<i64, GameTags>,
}

/// Per-appid lookups are independent; a missing appid is simply omitted
/// from the response rather than failing the whole batch.
pub async fn tags_batch(
    State(state): State<AppState>,
    Json(body): Json<TagsBatchRequest>,
) -> Result<impl IntoResponse> {
    validate_tags_batch(&body.appids)?;

    let mut tags = HashMap::with_capacity(body.appids.len());
    for appid in body.appids {
        if let Some(details) = state.storage.get_game(appid).await? {
            tags.insert(
                appid,
                GameTags {
                    genres: details.genres,
                    categories: details.categories,
                },
            );
        }
    }
    Ok(Json(TagsBatchResponse { tags }))
}
