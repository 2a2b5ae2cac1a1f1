//! Row types for the Storage Gateway (spec §3).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A title currently being polled.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatchlistEntry {
    pub appid: i64,
    pub name: String,
    pub last_count: i64,
    pub updated_at: i64,
}

/// A single raw player-count sample.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlayerSample {
    pub appid: i64,
    pub ts: i64,
    pub count: i64,
}

/// Shape shared by hourly and daily aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HourlyAggregate {
    pub appid: i64,
    pub hour_bucket_ts: i64,
    pub avg: f64,
    pub min: i64,
    pub max: i64,
    pub p95: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyAggregate {
    pub appid: i64,
    pub day_ymd: String,
    pub avg: f64,
    pub min: i64,
    pub max: i64,
    pub p95: i64,
}

/// Catalog cache row, populated by the catalog adapter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Game {
    pub appid: i64,
    pub name: String,
    pub is_free: bool,
    pub price: f64,
    pub release_date: Option<String>,
    pub coming_soon: bool,
    pub header_image: Option<String>,
    pub background_image: Option<String>,
    pub detailed_description: Option<String>,
}

/// A fully populated game with its tags, the shape the catalog adapter
/// produces and `upsert_game`/`get_game` round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDetails {
    pub appid: i64,
    pub name: String,
    pub is_free: bool,
    pub price: f64,
    pub release_date: Option<String>,
    pub coming_soon: bool,
    pub header_image: Option<String>,
    pub background_image: Option<String>,
    pub detailed_description: Option<String>,
    pub genres: Vec<String>,
    pub categories: Vec<String>,
}

impl From<Game> for GameDetails {
    fn from(g: Game) -> Self {
        Self {
            appid: g.appid,
            name: g.name,
            is_free: g.is_free,
            price: g.price,
            release_date: g.release_date,
            coming_soon: g.coming_soon,
            header_image: g.header_image,
            background_image: g.background_image,
            detailed_description: g.detailed_description,
            genres: Vec::new(),
            categories: Vec::new(),
        }
    }
}
