//! Health check handlers (spec §6): `GET /` and `GET /health`, both public
//! and exempt from the Request Gate and rate limiter.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub status: String,
}

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(RootResponse {
        message: format!("{} is running", state.config.service.name),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub scheduler: String,
}

/// Degrades to `"degraded"` (still 200) rather than 503 so a load balancer
/// doesn't pull the instance out of rotation over a transient DB hiccup the
/// scheduler or next request may recover from on its own.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database_ok = state.database_connected().await;
    let scheduler_ok = state.scheduler_running();

    let response = HealthResponse {
        status: if database_ok { "healthy" } else { "degraded" }.to_string(),
        database: if database_ok { "connected" } else { "disconnected" }.to_string(),
        scheduler: if scheduler_ok { "running" } else { "stopped" }.to_string(),
    };

    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_shape() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            database: "connected".to_string(),
            scheduler: "running".to_string(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["database"], "connected");
        assert_eq!(value["scheduler"], "running");
    }
}
