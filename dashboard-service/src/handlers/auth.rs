//! `POST /auth/login` (spec §4.3.5, §6): the one endpoint exempt from the
//! Request Gate, since it has no bearer yet. It verifies its own signature
//! inline before issuing a session token scoped to the signing client.

use axum::{
    body::to_bytes,
    extract::{Request, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth_core::SignedRequestParts;
use crate::error::{Error, Result};
use crate::state::AppState;

const HEADER_CLIENT_ID: &str = "x-client-id";
const HEADER_TIMESTAMP: &str = "x-timestamp";
const HEADER_NONCE: &str = "x-nonce";
const HEADER_SIGNATURE: &str = "x-signature";

#[derive(Debug, Deserialize)]
struct LoginRequest {
    client_id: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

pub async fn login(State(state): State<AppState>, request: Request) -> Result<impl IntoResponse> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let headers = request.headers().clone();

    let client_id = header_str(&headers, HEADER_CLIENT_ID)?;
    let timestamp = header_str(&headers, HEADER_TIMESTAMP)?;
    let nonce = header_str(&headers, HEADER_NONCE)?;
    let signature = header_str(&headers, HEADER_SIGNATURE)?;

    let max_body_bytes = state.config.request_gate.max_body_bytes;
    let bytes = to_bytes(request.into_body(), max_body_bytes)
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

    let body: LoginRequest = serde_json::from_slice(&bytes).map_err(|_| Error::Validation {
        field: "client_id".to_string(),
        message: "body must be {\"client_id\": \"...\"}".to_string(),
    })?;
    if body.client_id != client_id {
        return Err(Error::ClientMismatch);
    }

    let access_token = state.auth.sessions.issue(&client_id, &client_id)?;
    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.config.auth.session_ttl_secs,
    }))
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

    #[test]
    fn login_response_shape() {
        let response = LoginResponse {
            access_token: "token".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 1200,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["token_type"], "bearer");
        assert_eq!(value["expires_in"], 1200);
    }
}
