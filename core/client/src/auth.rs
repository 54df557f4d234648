//! OAuth2 client-credentials authentication and token caching.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::form_urlencoded;
use url::Url;

use idealista_common::{Credentials, Error, Result, TokenRecord};
use idealista_storage::TokenCache;

use crate::executor::{HttpRequest, RequestExecutor};

/// Scope requested when the caller does not name one.
pub const DEFAULT_SCOPE: &str = "read";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Source of the current time in epoch seconds.
pub type Clock = fn() -> i64;

fn system_clock() -> i64 {
    Utc::now().timestamp()
}

/// Obtains bearer tokens, reusing the cached one while it is fresh.
///
/// The cache is re-read on every call, so a token written by another
/// invocation of the tool is picked up.
pub struct AuthManager {
    credentials: Credentials,
    cache: TokenCache,
    executor: Arc<RequestExecutor>,
    token_url: Url,
    clock: Clock,
}

impl AuthManager {
    /// Create a new authentication manager.
    pub fn new(
        credentials: Credentials,
        cache: TokenCache,
        executor: Arc<RequestExecutor>,
        token_url: Url,
    ) -> Self {
        Self {
            credentials,
            cache,
            executor,
            token_url,
            clock: system_clock,
        }
    }

    /// Replace the clock used for freshness checks and expiry computation.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Get an access token.
    ///
    /// # Postconditions
    /// - Without `refresh`, a cached token expiring more than 60 s from now is
    ///   returned without any network call
    /// - Otherwise a new token is requested and cached with
    ///   `expires_at = <call start> + expires_in`
    ///
    /// # Errors
    /// - `CorruptState` if the token cache is unreadable
    /// - `Http` / `Network` from the token endpoint
    /// - `InvalidResponse` if the endpoint returns no access token
    pub async fn get_token(&self, scope: Option<&str>, refresh: bool) -> Result<String> {
        // One timestamp for both the freshness check and the new expiry.
        let now = (self.clock)();
        let cached = self.cache.load().await?;

        if !refresh {
            if let Some(record) = cached.filter(|record| record.is_fresh(now)) {
                debug!(expires_at = record.expires_at, "using cached access token");
                return Ok(record.access_token);
            }
        }

        let record = self.request_token(scope, now).await?;
        let path = self.cache.save(&record).await?;
        debug!(
            expires_at = record.expires_at,
            cache = %path.display(),
            "cached new access token"
        );

        Ok(record.access_token)
    }

    /// Run the client-credentials grant.
    async fn request_token(&self, scope: Option<&str>, issued_at: i64) -> Result<TokenRecord> {
        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("grant_type", "client_credentials");
        if let Some(scope) = scope.filter(|s| !s.is_empty()) {
            form.append_pair("scope", scope);
        }

        let request = HttpRequest::post(self.token_url.clone())
            .header(AUTHORIZATION, &basic_auth_header(&self.credentials))?
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)?
            .body(form.finish());

        debug!(url = %self.token_url, "requesting access token");

        match self.executor.execute(&request).await? {
            Value::Object(fields) => TokenRecord::from_response(fields, issued_at),
            other => Err(Error::InvalidResponse(format!(
                "token endpoint returned {} instead of an object",
                other
            ))),
        }
    }
}

/// `Basic base64(key:secret)`
pub fn basic_auth_header(credentials: &Credentials) -> String {
    let raw = format!("{}:{}", credentials.api_key, credentials.api_secret);
    format!("Basic {}", STANDARD.encode(raw))
}
