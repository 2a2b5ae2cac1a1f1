//! Security headers middleware
//!
//! Applies standard HTTP security headers using
//! `tower_http::set_header::SetResponseHeaderLayer`. Fixed, sensible
//! defaults -- this service has no admin surface that needs a tunable
//! Content-Security-Policy, so the knobs the teacher framework exposed here
//! are collapsed to a single `apply_security_headers` call.

use axum::http::HeaderValue;
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

/// Apply the standard security header set to every response.
pub fn apply_security_headers(app: Router) -> Router {
    app.layer(SetResponseHeaderLayer::if_not_present(
        http::header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    ))
    .layer(SetResponseHeaderLayer::if_not_present(
        http::header::X_FRAME_OPTIONS,
        HeaderValue::from_static("DENY"),
    ))
    .layer(SetResponseHeaderLayer::if_not_present(
        http::header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    ))
}
