//! Per-client rate limiting middleware (spec §4.3.6, §4.4).
//!
//! Runs independently of [`crate::request_gate`] so it still applies to
//! exempt paths like `/auth/login` ("exempt paths bypass the signed-request
//! check but may still be subject to rate limiting"). The request key is
//! derived with the *same* decoding rules as session verification (the
//! Auth Core's own leeway), falling back to the transport peer address when
//! no valid bearer is present -- deliberately independent of whether the
//! request would also pass the Request Gate, since a rejected or absent
//! token should still fall back to IP-keyed limiting rather than skip the
//! limiter entirely.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::auth_core::Category;
use crate::error::Result;
use crate::state::AppState;

const HEADER_AUTHORIZATION: &str = "authorization";
const BEARER_PREFIX: &str = "Bearer ";

/// `/health` and `/` are excluded; every other `/api/*` and `/auth/*` route
/// is subject to the limiter (spec §6).
fn requires_rate_limit(path: &str, protected_prefixes: &[String]) -> bool {
    protected_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

fn route_category(method: &Method, path: &str) -> Category {
    if path == "/auth/login" {
        return Category::Login;
    }
    match *method {
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE => Category::Write,
        _ => Category::Read,
    }
}

pub async fn rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let path = request.uri().path().to_string();
    if !requires_rate_limit(&path, &state.config.request_gate.protected_prefixes) {
        return Ok(next.run(request).await);
    }

    let category = route_category(request.method(), &path);
    let key = request
        .headers()
        .get(HEADER_AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .and_then(|token| state.auth.sessions.verify(token).ok())
        .map(|claims| claims.client_id)
        .unwrap_or_else(|| addr.ip().to_string());

    state.auth.rate_limits.check(category, &key)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> Vec<String> {
        vec!["/api".to_string(), "/auth".to_string()]
    }

    #[test]
    fn health_and_root_are_excluded() {
        assert!(!requires_rate_limit("/health", &prefixes()));
        assert!(!requires_rate_limit("/", &prefixes()));
    }

    #[test]
    fn login_is_still_rate_limited() {
        assert!(requires_rate_limit("/auth/login", &prefixes()));
        assert_eq!(route_category(&Method::POST, "/auth/login"), Category::Login);
    }

    #[test]
    fn mutating_api_methods_are_write_category() {
        assert_eq!(route_category(&Method::POST, "/api/watchlist"), Category::Write);
        assert_eq!(route_category(&Method::DELETE, "/api/watchlist/730"), Category::Write);
    }

    #[test]
    fn reads_default_to_read_category() {
        assert_eq!(route_category(&Method::GET, "/api/games"), Category::Read);
    }
}
