//! Shared HTTP transport for the upstream adapters.
//!
//! One `reqwest::Client` per process (connection pooling, protocol
//! negotiated via ALPN -- HTTP/2 where the upstream supports it, HTTP/1.1
//! otherwise), paired with a small retry helper: up to 3 attempts,
//! exponential backoff from 0.5s to 4s, retried only on transport errors
//! and 5xx responses -- a 4xx means the request itself is wrong and
//! retrying won't help (spec §4.2).

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::error::{Error, Result};

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(4);

pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent("dashboard-api")
        .build()
        .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))
}

/// Run `request` up to [`MAX_ATTEMPTS`] times, retrying on transport errors
/// and 5xx status codes only. Returns the first successful response, the
/// first non-retryable error response, or the last error if every attempt
/// was retryable and exhausted.
pub async fn send_with_retry<F, Fut>(label: &str, mut request: F) -> Result<Response>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = reqwest::Result<Response>>,
{
    let mut backoff = INITIAL_BACKOFF;
    let mut last_err: Option<Error> = None;

    for attempt in 1..=MAX_ATTEMPTS {
        match request().await {
            Ok(resp) if resp.status().is_server_error() => {
                tracing::warn!(label, attempt, status = %resp.status(), "upstream 5xx, retrying");
                last_err = Some(Error::UpstreamUnavailable(format!(
                    "{label} returned {}",
                    resp.status()
                )));
            }
            Ok(resp) => return Ok(resp),
            Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                tracing::warn!(label, attempt, error = %e, "upstream transport error, retrying");
                last_err = Some(Error::UpstreamUnavailable(format!("{label}: {e}")));
            }
            Err(e) => {
                // Anything else (e.g. a body decode error) is not retryable.
                return Err(Error::UpstreamUnavailable(format!("{label}: {e}")));
            }
        }

        if attempt < MAX_ATTEMPTS {
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    Err(last_err.unwrap_or_else(|| Error::UpstreamUnavailable(format!("{label}: exhausted retries"))))
}

/// Never retry on explicit 4xx -- convenience used by adapters that need to
/// distinguish "bad request to upstream" from "upstream down" after the
/// retry loop returns a non-success status.
pub fn is_client_error(status: StatusCode) -> bool {
    status.is_client_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_error_detection() {
        assert!(is_client_error(StatusCode::NOT_FOUND));
        assert!(!is_client_error(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
