//! Watchlist endpoints (spec §4.6, §6). Mutations are idempotent: repeating
//! an add with the same arguments or removing an already-absent appid both
//! succeed without changing row counts further.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;
use crate::storage::WatchlistEntry;
use crate::validation::validate_appid;

#[derive(Debug, Serialize)]
pub struct WatchlistResponse {
    pub watchlist: Vec<WatchlistEntry>,
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let watchlist = state.storage.get_watchlist().await?;
    Ok(Json(WatchlistResponse { watchlist }))
}

#[derive(Debug, Deserialize)]
pub struct AddWatchlistRequest {
    pub appid: i64,
    pub name: String,
}

pub async fn add(
    State(state): State<AppState>,
    Json(body): Json<AddWatchlistRequest>,
) -> Result<impl IntoResponse> {
    let appid = validate_appid(body.appid)?;
    state.storage.upsert_watchlist(appid, &body.name, 0).await?;
    Ok(StatusCode::OK)
}

pub async fn remove(
    State(state): State<AppState>,
    Path(appid): Path<i64>,
) -> Result<impl IntoResponse> {
    let appid = validate_appid(appid)?;
    state.storage.remove_from_watchlist(appid).await?;
    Ok(StatusCode::NO_CONTENT)
}
