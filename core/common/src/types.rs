//! Credential and token types shared across the client crates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::{Error, Result};

/// Seconds before `expires_at` at which a cached token stops being used.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// API key/secret pair used for the client-credentials grant.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    /// Create a credential pair.
    ///
    /// # Errors
    /// - Returns `InvalidInput` if either half is empty
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(Error::InvalidInput(
                "API key and secret must both be non-empty".to_string(),
            ));
        }
        Ok(Self {
            api_key,
            api_secret,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// OAuth token as persisted in the token cache.
///
/// `extra` keeps every other field the provider returned (`token_type`,
/// `scope`, `jti`, ...) so the cache file mirrors the raw response.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: i64,
    /// Absolute expiry in epoch seconds: issue time + `expires_in`.
    #[serde(default)]
    pub expires_at: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenRecord {
    /// Build a record from a token endpoint response issued at `issued_at`.
    ///
    /// # Errors
    /// - `InvalidResponse` if `access_token` is missing, or `expires_in` is not
    ///   numeric or too large to add to `issued_at`
    pub fn from_response(mut fields: Map<String, Value>, issued_at: i64) -> Result<Self> {
        let access_token = match fields.remove("access_token") {
            Some(Value::String(token)) if !token.is_empty() => token,
            _ => {
                return Err(Error::InvalidResponse(
                    "token response has no access_token".to_string(),
                ))
            }
        };

        let expires_in = match fields.remove("expires_in") {
            None | Some(Value::Null) => 0,
            Some(value) => as_integer(&value).ok_or_else(|| {
                Error::InvalidResponse(format!("expires_in is not an integer: {}", value))
            })?,
        };
        fields.remove("expires_at");
        let expires_at = issued_at.checked_add(expires_in).ok_or_else(|| {
            Error::InvalidResponse(format!("expires_in is out of range: {}", expires_in))
        })?;

        Ok(Self {
            access_token,
            expires_in,
            expires_at,
            extra: fields,
        })
    }

    /// Decode a record read back from the cache.
    ///
    /// Returns `None` when the cached object carries no usable token.
    pub fn from_cached(mut fields: Map<String, Value>) -> Option<Self> {
        let access_token = match fields.remove("access_token") {
            Some(Value::String(token)) if !token.is_empty() => token,
            _ => return None,
        };
        let expires_in = fields
            .remove("expires_in")
            .as_ref()
            .and_then(as_integer)
            .unwrap_or(0);
        let expires_at = fields
            .remove("expires_at")
            .as_ref()
            .and_then(as_integer)
            .unwrap_or(0);

        Some(Self {
            access_token,
            expires_in,
            expires_at,
            extra: fields,
        })
    }

    /// Whether the token can still be used at `now` (epoch seconds).
    pub fn is_fresh(&self, now: i64) -> bool {
        self.expires_at > now + EXPIRY_MARGIN_SECS
    }

    /// Flatten back into the JSON object stored on disk.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut fields = self.extra.clone();
        fields.insert(
            "access_token".to_string(),
            Value::String(self.access_token.clone()),
        );
        fields.insert("expires_in".to_string(), Value::from(self.expires_in));
        fields.insert("expires_at".to_string(), Value::from(self.expires_at));
        fields
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Read an integer that providers sometimes send as a string.
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
