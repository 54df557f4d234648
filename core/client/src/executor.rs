//! Resilient HTTP request execution.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;
use url::Url;

use idealista_common::{Error, Result};

use crate::retry::{parse_retry_after, RetryDecision, RetryPolicy, RetryState};

/// Longest slice of an error body quoted in an error message.
const ERROR_BODY_LIMIT: usize = 500;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A fully buffered request, replayable on every attempt.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Create a POST request with no headers and an empty body.
    pub fn post(url: Url) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Add a header.
    ///
    /// # Errors
    /// - `InvalidInput` if the value is not a valid header value
    pub fn header(mut self, name: HeaderName, value: &str) -> Result<Self> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidInput(format!("Invalid {} header: {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Issues HTTP requests, retrying rate limits and transient failures.
///
/// Attempts for one request run strictly one after another; backoff sleeps
/// cannot be cancelled.
pub struct RequestExecutor {
    http: Client,
    timeout: Duration,
    policy: RetryPolicy,
}

impl RequestExecutor {
    /// Create a new executor.
    ///
    /// `timeout` bounds each attempt separately, not the whole retry loop.
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("idealista-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            timeout,
            policy,
        })
    }

    /// Execute `request` and parse the response body as JSON.
    ///
    /// # Errors
    /// - `Http` for a terminal status, or a retryable one once retries run out
    /// - `Network` for connection failures once retries run out
    /// - `InvalidResponse` if a successful response is not JSON
    pub async fn execute(&self, request: &HttpRequest) -> Result<Value> {
        let mut state = RetryState::new(&self.policy);

        loop {
            debug!(
                attempt = state.attempt() + 1,
                method = %request.method,
                url = %request.url,
                "sending request"
            );

            let (error, retry_after) = match self.send_once(request).await {
                Ok(value) => {
                    if state.attempt() > 0 {
                        debug!(retries = state.attempt(), "request succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            match state.decide(&self.policy, error, retry_after) {
                RetryDecision::Retry { wait, cause } => {
                    debug!(
                        attempt = state.attempt(),
                        max_retries = self.policy.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        "{}. Retrying",
                        cause
                    );
                    if !wait.is_zero() {
                        sleep(wait).await;
                    }
                }
                RetryDecision::Fail(error) => return Err(error),
            }
        }
    }

    /// One attempt. Failures carry the server's `Retry-After`, if any.
    async fn send_once(
        &self,
        request: &HttpRequest,
    ) -> std::result::Result<Value, (Error, Option<Duration>)> {
        let response = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| (transport_error(&request.url, e), None))?;

        let status = response.status();
        if status.is_success() {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| (transport_error(&request.url, e), None))?;
            return serde_json::from_slice(&bytes).map_err(|e| {
                (
                    Error::InvalidResponse(format!("{} returned invalid JSON: {}", request.url, e)),
                    None,
                )
            });
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().await.ok().filter(|text| !text.is_empty());

        Err((http_error(status.as_u16(), &request.url, body), retry_after))
    }
}

/// Build the error for a non-success status.
fn http_error(status: u16, url: &Url, body: Option<String>) -> Error {
    let mut message = format!("HTTP {} calling {}", status, url);
    if let Some(text) = &body {
        let excerpt: String = text.chars().take(ERROR_BODY_LIMIT).collect();
        message.push_str(": ");
        message.push_str(&excerpt);
    }
    Error::Http {
        status,
        message,
        body,
    }
}

/// Map a reqwest failure without an HTTP status.
fn transport_error(url: &Url, err: reqwest::Error) -> Error {
    if err.is_builder() {
        return Error::InvalidInput(format!("Cannot build request for {}: {}", url, err));
    }
    Error::Network(format!("Network error calling {}: {}", url, err))
}
