//! API Surface (spec §4.6): thin handlers that validate, call the Storage
//! Gateway or an Upstream Adapter, and shape the response. No business
//! logic lives here.

pub mod auth;
pub mod deals;
pub mod games;
pub mod steam;
pub mod watchlist;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::health;
use crate::state::AppState;

/// Assemble every route. `Server::serve` wraps this router with the
/// transport-level middleware stack (tracing, compression, the Request
/// Gate, the rate limiter, ...).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login))
        .route("/api/watchlist", get(watchlist::list).post(watchlist::add))
        .route("/api/watchlist/{appid}", delete(watchlist::remove))
        .route("/api/games", get(games::list))
        .route("/api/games/{appid}", get(games::get))
        .route("/api/games/{appid}/current-players", get(games::current_players))
        .route("/api/games/tags/batch", post(games::tags_batch))
        .route("/api/steam/most-played", get(steam::most_played))
        .route("/api/steam/coming-soon", get(steam::coming_soon))
        .route("/api/steam/player/{steamid}/summary", get(steam::player_summary))
        .route("/api/steam/player/{steamid}/owned-games", get(steam::owned_games))
        .route(
            "/api/steam/player/{steamid}/recently-played",
            get(steam::recently_played),
        )
        .route("/api/steam/player/{steamid}/badges", get(steam::badges))
        .route("/api/deals/best", get(deals::best))
        .route("/api/deals/game/{appid}", get(deals::for_game))
}
