use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitDataError {
    #[error("hash is missing")]
    MissingHash,
    #[error("hash check failed")]
    HashMismatch,
    #[error("user data is missing")]
    MissingUser,
    #[error("user data is malformed")]
    InvalidUser,
}

/// Validates a Telegram Mini-App `initData` payload against the bot token.
///
/// The payload is a URL-encoded string of key/value pairs carrying a `hash`
/// field. The remaining pairs, sorted lexicographically by key and joined as
/// `key=value` lines, are HMAC-SHA256-signed with SHA-256(bot_token) as the
/// key; the hex digest must match `hash`. Comparison is constant-time.
///
/// Every pair takes part in the data-check string, repeated keys included.
/// Returns the field mapping minus `hash` (last occurrence wins for repeated
/// keys). Pure, no side effects.
pub fn verify_init_data(
    init_data: &str,
    bot_token: &str,
) -> Result<BTreeMap<String, String>, InitDataError> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut provided_hash: Option<String> = None;

    for (key, value) in url::form_urlencoded::parse(init_data.as_bytes()) {
        if key == "hash" {
            provided_hash = Some(value.into_owned());
        } else {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }

    let provided_hash = provided_hash.ok_or(InitDataError::MissingHash)?;

    // Stable sort: repeated keys keep their payload order in the data-check
    // string.
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let data_check_string = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    let secret = Sha256::digest(bot_token.as_bytes());
    let mut mac = HmacSha256::new_from_slice(&secret).expect("HMAC accepts any key length");
    mac.update(data_check_string.as_bytes());
    let calculated = hex::encode(mac.finalize().into_bytes());

    if bool::from(calculated.as_bytes().ct_eq(provided_hash.as_bytes())) {
        Ok(pairs.into_iter().collect())
    } else {
        Err(InitDataError::HashMismatch)
    }
}

/// Identity claim embedded in a verified payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl TelegramUser {
    /// Stable external identifier: decimal form of the numeric Telegram id.
    pub fn open_id(&self) -> String {
        self.id.to_string()
    }

    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// Extracts the identity from the `user` (or `receiver`) field of a verified
/// mapping.
pub fn parse_identity(fields: &BTreeMap<String, String>) -> Result<TelegramUser, InitDataError> {
    let raw = fields
        .get("user")
        .or_else(|| fields.get("receiver"))
        .ok_or(InitDataError::MissingUser)?;
    serde_json::from_str(raw).map_err(|_| InitDataError::InvalidUser)
}
