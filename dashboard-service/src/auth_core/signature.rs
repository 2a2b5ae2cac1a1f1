//! Per-request HMAC signatures (spec §4.3.3).
//!
//! Canonical message: `METHOD | PATH | HEX(SHA256(body)) | TIMESTAMP | NONCE`.
//! Signature: `BASE64(HMAC-SHA256(client_secret, message))`, compared in
//! constant time via `subtle` so a wrong signature never leaks timing
//! information about how many leading bytes matched.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// The headers a signed request must carry.
#[derive(Debug, Clone)]
pub struct SignedRequestParts<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub body: &'a [u8],
    pub timestamp: &'a str,
    pub nonce: &'a str,
}

pub fn canonical_message(parts: &SignedRequestParts<'_>) -> String {
    let body_hash = encode_hex(&Sha256::digest(parts.body));
    format!(
        "{}|{}|{}|{}|{}",
        parts.method, parts.path, body_hash, parts.timestamp, parts.nonce
    )
}

pub fn sign(client_secret: &str, parts: &SignedRequestParts<'_>) -> String {
    let message = canonical_message(parts);
    let mut mac =
        HmacSha256::new_from_slice(client_secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Constant-time comparison between the computed and supplied signatures.
/// Both sides are base64-decoded first so comparison is over raw MAC bytes,
/// not over base64 text (which would leak length/alphabet information).
pub fn verify(client_secret: &str, parts: &SignedRequestParts<'_>, supplied_signature: &str) -> bool {
    let expected = match STANDARD.decode(sign(client_secret, parts)) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let supplied = match STANDARD.decode(supplied_signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    if expected.len() != supplied.len() {
        return false;
    }
    expected.ct_eq(&supplied).into()
}

fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> SignedRequestParts<'static> {
        SignedRequestParts {
            method: "GET",
            path: "/api/watchlist",
            body: b"",
            timestamp: "1700000000",
            nonce: "abcdefghij0123456789",
        }
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let signature = sign("client-secret", &parts());
        assert!(verify("client-secret", &parts(), &signature));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let signature = sign("client-secret", &parts());
        assert!(!verify("other-secret", &parts(), &signature));
    }

    #[test]
    fn tampered_signature_fails() {
        let mut signature = sign("client-secret", &parts());
        signature.push('x');
        assert!(!verify("client-secret", &parts(), &signature));
    }

    #[test]
    fn different_path_changes_signature() {
        let mut other = parts();
        other.path = "/api/games";
        assert_ne!(sign("client-secret", &parts()), sign("client-secret", &other));
    }
}
