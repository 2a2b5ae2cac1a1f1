//! Input validation shared by the API Surface handlers (spec §7, §8).
//!
//! Kept deliberately dumb: every function either returns the validated
//! value or an [`Error::Validation`] naming the offending field. No
//! handler constructs its own ad hoc range check.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

pub const MAX_APPID: i64 = 10_000_000;
pub const MAX_TAGS_BATCH: usize = 100;
pub const MAX_DEALS_LIMIT: u32 = 50;
pub const MIN_NONCE_LEN: usize = 16;

static VANITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,32}$").expect("valid regex"));
static STEAMID64: Lazy<Regex> = Lazy::new(|| Regex::new(r"^7656119\d{10}$").expect("valid regex"));
static COMMUNITY_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"steamcommunity\.com/(?:id|profiles)/([^/?#]+)").expect("valid regex")
});

/// `appid <= 0` or `> 10_000_000` is rejected (spec §8 boundary behavior).
pub fn validate_appid(appid: i64) -> Result<i64> {
    if appid <= 0 || appid > MAX_APPID {
        return Err(Error::Validation {
            field: "appid".to_string(),
            message: format!("must be in 1..={MAX_APPID}"),
        });
    }
    Ok(appid)
}

/// A tags-batch request body may carry at most [`MAX_TAGS_BATCH`] appids.
pub fn validate_tags_batch(appids: &[i64]) -> Result<()> {
    if appids.is_empty() {
        return Err(Error::Validation {
            field: "appids".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if appids.len() > MAX_TAGS_BATCH {
        return Err(Error::Validation {
            field: "appids".to_string(),
            message: format!("batch of {} exceeds the {MAX_TAGS_BATCH} limit", appids.len()),
        });
    }
    for appid in appids {
        validate_appid(*appid)?;
    }
    Ok(())
}

pub fn validate_deals_limit(limit: u32) -> Result<u32> {
    if limit == 0 || limit > MAX_DEALS_LIMIT {
        return Err(Error::Validation {
            field: "limit".to_string(),
            message: format!("must be in 1..={MAX_DEALS_LIMIT}"),
        });
    }
    Ok(limit)
}

pub fn validate_min_discount(min_discount: u32) -> Result<u32> {
    if min_discount > 100 {
        return Err(Error::Validation {
            field: "min_discount".to_string(),
            message: "must be in 0..=100".to_string(),
        });
    }
    Ok(min_discount)
}

/// The three shapes `GET /api/steam/player/{steamid}` accepts (spec §6):
/// a 17-digit SteamID64 starting `7656119`, a bare vanity name, or a
/// community profile URL wrapping either of those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SteamIdInput {
    Id64(String),
    Vanity(String),
}

pub fn parse_steamid(raw: &str) -> Result<SteamIdInput> {
    let candidate = COMMUNITY_URL
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    if STEAMID64.is_match(candidate) {
        return Ok(SteamIdInput::Id64(candidate.to_string()));
    }
    if VANITY.is_match(candidate) {
        return Ok(SteamIdInput::Vanity(candidate.to_string()));
    }
    Err(Error::Validation {
        field: "steamid".to_string(),
        message: "must be a steamid64, a vanity name, or a community profile URL".to_string(),
    })
}

/// `X-Nonce` must carry at least [`MIN_NONCE_LEN`] bytes of entropy,
/// enforced again at the handler boundary as a defense-in-depth check on
/// top of Auth Core's own rejection (spec §8 boundary behavior).
pub fn validate_nonce_len(nonce: &str) -> Result<()> {
    if nonce.len() < MIN_NONCE_LEN {
        return Err(Error::Validation {
            field: "X-Nonce".to_string(),
            message: format!("must carry at least {MIN_NONCE_LEN} bytes of entropy"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appid_boundary() {
        assert!(validate_appid(0).is_err());
        assert!(validate_appid(-1).is_err());
        assert!(validate_appid(1).is_ok());
        assert!(validate_appid(MAX_APPID).is_ok());
        assert!(validate_appid(MAX_APPID + 1).is_err());
    }

    #[test]
    fn tags_batch_boundary() {
        let at_limit: Vec<i64> = (1..=100).collect();
        assert!(validate_tags_batch(&at_limit).is_ok());
        let over_limit: Vec<i64> = (1..=101).collect();
        assert!(validate_tags_batch(&over_limit).is_err());
    }

    #[test]
    fn steamid64_recognized() {
        assert_eq!(
            parse_steamid("76561198000000000").unwrap(),
            SteamIdInput::Id64("76561198000000000".to_string())
        );
    }

    #[test]
    fn vanity_name_recognized() {
        assert_eq!(
            parse_steamid("some_user42").unwrap(),
            SteamIdInput::Vanity("some_user42".to_string())
        );
    }

    #[test]
    fn community_url_extracts_vanity() {
        assert_eq!(
            parse_steamid("https://steamcommunity.com/id/some_user42").unwrap(),
            SteamIdInput::Vanity("some_user42".to_string())
        );
    }

    #[test]
    fn community_url_extracts_id64() {
        assert_eq!(
            parse_steamid("https://steamcommunity.com/profiles/76561198000000000").unwrap(),
            SteamIdInput::Id64("76561198000000000".to_string())
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_steamid("a").is_err());
        assert!(parse_steamid("has spaces and stuff!!").is_err());
    }

    #[test]
    fn nonce_length_boundary() {
        assert!(validate_nonce_len(&"a".repeat(15)).is_err());
        assert!(validate_nonce_len(&"a".repeat(16)).is_ok());
    }
}
