//! Deals endpoints (spec §4.6, §6).

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::adapters::Deal;
use crate::error::Result;
use crate::state::AppState;
use crate::validation::{validate_appid, validate_deals_limit, validate_min_discount};

const DEFAULT_LIMIT: u32 = 10;
const DEFAULT_MIN_DISCOUNT: u32 = 0;

#[derive(Debug, Deserialize)]
pub struct BestDealsQuery {
    pub limit: Option<u32>,
    pub min_discount: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DealsResponse {
    pub deals: Vec<Deal>,
}

pub async fn best(
    State(state): State<AppState>,
    Query(query): Query<BestDealsQuery>,
) -> Result<impl IntoResponse> {
    let limit = validate_deals_limit(query.limit.unwrap_or(DEFAULT_LIMIT))?;
    let min_discount = validate_min_discount(query.min_discount.unwrap_or(DEFAULT_MIN_DISCOUNT))?;

    let deals = state.adapters.deals.best_deals(limit, min_discount).await?;
    Ok(Json(DealsResponse { deals }))
}

pub async fn for_game(State(state): State<AppState>, Path(appid): Path<i64>) -> Result<impl IntoResponse> {
    let appid = validate_appid(appid)?;
    let deals = state.adapters.deals.deals_for_game(appid).await?;
    Ok(Json(DealsResponse { deals }))
}
