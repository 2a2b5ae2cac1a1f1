//! Request Gate (spec §4.4): body-capped, read-once-hash-once signed-request
//! middleware for protected paths.
//!
//! The body is buffered exactly once, capped at `max_body_bytes` (413 on
//! oversize), hashed for the canonical signature message, then the
//! identical bytes are reassembled into the request so the handler sees
//! exactly what was verified. For every gated path other than the login
//! exemption, the bearer session is also verified here and its claims are
//! attached to the request so handlers can read the authenticated
//! `client_id` without re-decoding the token (spec §4.3.5: a protected
//! endpoint requires both a valid signature and a valid session whose
//! `client_id` matches `X-Client-Id`).

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth_core::{SessionClaims, SignedRequestParts};
use crate::error::{Error, Result};
use crate::state::AppState;

const HEADER_CLIENT_ID: &str = "x-client-id";
const HEADER_TIMESTAMP: &str = "x-timestamp";
const HEADER_NONCE: &str = "x-nonce";
const HEADER_SIGNATURE: &str = "x-signature";
const HEADER_AUTHORIZATION: &str = "authorization";
const BEARER_PREFIX: &str = "Bearer ";

/// True if `path` falls under a protected prefix and is not explicitly
/// exempt (health checks, root, login).
pub fn requires_gate(path: &str, protected_prefixes: &[String], exempt_paths: &[String]) -> bool {
    if exempt_paths.iter().any(|p| p == path) {
        return false;
    }
    protected_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

pub async fn verify_signed_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let path = request.uri().path().to_string();
    if !requires_gate(
        &path,
        &state.config.request_gate.protected_prefixes,
        &state.config.request_gate.exempt_paths,
    ) {
        return Ok(next.run(request).await);
    }

    let method = request.method().to_string();
    let headers = request.headers().clone();
    let client_id = header_str(&headers, HEADER_CLIENT_ID)?;
    let timestamp = header_str(&headers, HEADER_TIMESTAMP)?;
    let nonce = header_str(&headers, HEADER_NONCE)?;
    let signature = header_str(&headers, HEADER_SIGNATURE)?;

    let (parts, body) = request.into_parts();
    let max_body_bytes = state.config.request_gate.max_body_bytes;
    let bytes = to_bytes(body, max_body_bytes)
        .await
        .map_err(|_| Error::BodyTooLarge)?;

    let signed_parts = SignedRequestParts {
        method: &method,
        path: &path,
        body: &bytes,
        timestamp: &timestamp,
        nonce: &nonce,
    };
    state
        .auth
        .verify_signed_request(&client_id, &signed_parts, &signature)
        .await?;

    // Every gated path other than `/auth/login` (exempt above) also needs a
    // bearer session scoped to the same client (spec §4.3.5).
    let bearer = header_str(&headers, HEADER_AUTHORIZATION)?;
    let token = bearer.strip_prefix(BEARER_PREFIX).ok_or(Error::MissingHeaders)?;
    let claims: SessionClaims = state.auth.verify_session(token, &client_id)?;

    let mut parts = parts;
    parts.extensions.insert(claims);
    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

fn header_str(headers: &axum::http::HeaderMap, name: &str) -> Result<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or(Error::MissingHeaders)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> Vec<String> {
        vec!["/api".to_string(), "/auth".to_string()]
    }

    fn exempt() -> Vec<String> {
        vec!["/".to_string(), "/health".to_string(), "/auth/login".to_string()]
    }

    #[test]
    fn exempts_health_and_root() {
        assert!(!requires_gate("/", &prefixes(), &exempt()));
        assert!(!requires_gate("/health", &prefixes(), &exempt()));
    }

    #[test]
    fn exempts_login_but_gates_other_auth_paths() {
        assert!(!requires_gate("/auth/login", &prefixes(), &exempt()));
        assert!(requires_gate("/auth/logout", &prefixes(), &exempt()));
    }

    #[test]
    fn gates_protected_api_paths() {
        assert!(requires_gate("/api/watchlist", &prefixes(), &exempt()));
    }

    #[test]
    fn unrelated_paths_are_not_gated() {
        assert!(!requires_gate("/static/app.js", &prefixes(), &exempt()));
    }
}
