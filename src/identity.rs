//! Identity resolution from OCID-style session tokens.
//!
//! The token is a JWT issued by the campus identity provider. Only the payload
//! segment is decoded; the signature is not checked here because the token
//! arrives over the authenticated login transport. Any shape mismatch fails
//! closed: no partially populated record is ever produced.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Verified-session identity derived from a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityRecord {
    /// Lowercase `0x`-prefixed wallet address.
    pub address: String,
    pub username: String,
    pub issuer: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub audience: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    /// Claims outside the known set, kept verbatim.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl IdentityRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// `0x1234...abcd` form shown in the wallet menu.
    pub fn short_address(&self) -> String {
        format_address(&self.address)
    }
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    eth_address: String,
    edu_username: String,
    iss: String,
    iat: i64,
    exp: i64,
    aud: String,
    #[serde(default)]
    user_id: Option<u64>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

/// Decode a session token into an identity.
///
/// `None` (or a blank token) means there is no verified session.
pub fn resolve_identity(token: Option<&str>) -> Result<Option<IdentityRecord>, IdentityError> {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    decode_token(token).map(Some)
}

/// Fail-closed variant used by the session reconciler: a malformed token is
/// logged and treated as no session.
pub fn resolve_identity_or_absent(token: Option<&str>) -> Option<IdentityRecord> {
    match resolve_identity(token) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Treating session as absent: {}", e);
            None
        }
    }
}

fn decode_token(token: &str) -> Result<IdentityRecord, IdentityError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(IdentityError::malformed(
            "expected three dot-separated segments",
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| IdentityError::malformed(format!("payload is not base64url: {e}")))?;
    let claims: TokenClaims = serde_json::from_slice(&bytes)
        .map_err(|e| IdentityError::malformed(format!("payload claims: {e}")))?;

    let address = normalize_wallet_address(&claims.eth_address).ok_or_else(|| {
        IdentityError::malformed("eth_address must be a 0x-prefixed 40-hex address")
    })?;
    let issued_at = timestamp("iat", claims.iat)?;
    let expires_at = timestamp("exp", claims.exp)?;

    Ok(IdentityRecord {
        address,
        username: claims.edu_username,
        issuer: claims.iss,
        issued_at,
        expires_at,
        audience: claims.aud,
        user_id: claims.user_id,
        extra: claims.extra,
    })
}

fn timestamp(claim: &str, secs: i64) -> Result<DateTime<Utc>, IdentityError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| IdentityError::malformed(format!("{claim} is out of range")))
}

pub fn normalize_wallet_address(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if !trimmed.starts_with("0x") || trimmed.len() != 42 {
        return None;
    }
    let hex = &trimmed[2..];
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(trimmed.to_ascii_lowercase())
}

/// Shorten an address to its first six and last four characters.
pub fn format_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}
