//! Error types and HTTP response conversion
//!
//! The taxonomy below follows spec §7: client validation failures map to 4xx
//! with a safe, field-specific message; auth/replay failures map to 401/403
//! with a generic message; storage and upstream failures map to 503; any
//! uncaught defect maps to a 500 with an opaque correlation id. No variant
//! ever carries raw exception text, SQL, or internal paths into its client
//! response -- those details go to `tracing::error!` only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Fatal at startup: missing/invalid config (empty session secret, empty
    /// client registry, unparseable config file). The process must refuse to
    /// serve traffic.
    #[error("configuration error: {0}")]
    Config(String),

    /// Client-supplied input failed validation (out-of-range appid, bad
    /// steamid shape, oversized batch, ...). `field` names the offending
    /// input so the client can fix it without leaking internals.
    #[error("validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// Missing signature headers.
    #[error("missing signature headers")]
    MissingHeaders,

    /// `X-Client-Id` is not in the client registry.
    #[error("unknown client")]
    UnknownClient,

    /// `X-Timestamp` outside the allowed window, or an expired/invalid bearer.
    #[error("stale request")]
    StaleRequest,

    /// Bearer token missing, malformed, or its signature didn't verify.
    #[error("invalid session token")]
    InvalidSession,

    /// Nonce already seen within its TTL.
    #[error("replayed nonce")]
    ReplayedNonce,

    /// Recomputed HMAC does not match the supplied signature.
    #[error("bad signature")]
    BadSignature,

    /// Bearer `client_id` does not match `X-Client-Id`.
    #[error("client mismatch")]
    ClientMismatch,

    /// Request body exceeded the Request Gate's configured cap.
    #[error("request body too large")]
    BodyTooLarge,

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Per-client/IP rate limit exceeded; `retry_after_secs` feeds the
    /// `Retry-After` header.
    #[error("rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    /// Adapter returned no data after retries and no cached fallback exists.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Unrecoverable database error. The message is logged, never echoed.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Catch-all for anything else; always surfaced as a generic 500 with a
    /// correlation id, full detail logged server-side only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Error response body shape mandated by spec §6: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, detail, retry_after): (StatusCode, String, Option<u64>) = match self {
            Error::Config(ref msg) => {
                tracing::error!(error = %msg, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "service misconfigured".to_string(),
                    None,
                )
            }
            Error::Validation { ref field, ref message } => (
                StatusCode::BAD_REQUEST,
                format!("invalid {field}: {message}"),
                None,
            ),
            Error::MissingHeaders => (
                StatusCode::UNAUTHORIZED,
                "missing signature headers".to_string(),
                None,
            ),
            Error::UnknownClient => (StatusCode::FORBIDDEN, "unknown client".to_string(), None),
            Error::StaleRequest => (StatusCode::UNAUTHORIZED, "stale request".to_string(), None),
            Error::InvalidSession => (
                StatusCode::UNAUTHORIZED,
                "invalid or expired session".to_string(),
                None,
            ),
            Error::ReplayedNonce => (
                StatusCode::FORBIDDEN,
                "replayed nonce".to_string(),
                None,
            ),
            Error::BadSignature => (StatusCode::UNAUTHORIZED, "bad signature".to_string(), None),
            Error::ClientMismatch => (
                StatusCode::FORBIDDEN,
                "client mismatch".to_string(),
                None,
            ),
            Error::BodyTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "request body too large".to_string(),
                None,
            ),
            Error::NotFound(ref what) => (StatusCode::NOT_FOUND, format!("{what} not found"), None),
            Error::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate limit exceeded".to_string(),
                Some(retry_after_secs),
            ),
            Error::UpstreamUnavailable(ref msg) => {
                tracing::warn!(error = %msg, "upstream unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream data unavailable".to_string(),
                    None,
                )
            }
            Error::Storage(ref e) => {
                tracing::error!(error = %e, "storage error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage temporarily unavailable".to_string(),
                    None,
                )
            }
            Error::Internal(ref msg) => {
                let correlation_id = Uuid::new_v4();
                tracing::error!(%correlation_id, error = %msg, "unhandled internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("internal error (ref {correlation_id})"),
                    None,
                )
            }
        };

        let mut response = (status, Json(ErrorBody { detail })).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = http::HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_the_field() {
        let err = Error::Validation {
            field: "appid".to_string(),
            message: "must be > 0".to_string(),
        };
        assert_eq!(err.to_string(), "validation failed for appid: must be > 0");
    }
}
