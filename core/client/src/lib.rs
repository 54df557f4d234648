//! Idealista API client
//!
//! This module provides the network side of the client, including:
//! - OAuth2 client-credentials authentication with a persistent token cache
//! - Credential resolution from the environment and the config file
//! - A request executor with timeouts and bounded exponential backoff
//! - Single-page and multi-page property search
//!
//! All calls are issued one after another; nothing runs concurrently.

pub mod auth;
pub mod client;
pub mod credentials;
pub mod endpoints;
pub mod executor;
pub mod retry;
pub mod search;

// Re-export main types
pub use auth::{basic_auth_header, AuthManager, Clock, DEFAULT_SCOPE};
pub use client::{ClientBuilder, IdealistaClient, DEFAULT_MAX_RETRIES};
pub use credentials::{CredentialResolver, Environment, API_KEY_VAR, API_SECRET_VAR};
pub use endpoints::{Endpoints, DEFAULT_BASE_URL, SEARCH_API_VERSION};
pub use executor::{HttpRequest, RequestExecutor, DEFAULT_TIMEOUT};
pub use retry::{RetryDecision, RetryPolicy, RetryState, RETRYABLE_STATUSES};
pub use search::{encode_multipart, page_count, SearchClient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let _policy = RetryPolicy::default();
        let _env = Environment::default();
        let _endpoints = Endpoints::production().unwrap();
        assert_eq!(page_count(None, 3), 3);
    }
}
