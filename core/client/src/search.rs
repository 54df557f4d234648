//! Listing search: single pages and multi-page aggregation.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use idealista_common::{keys, Error, Result, SearchParams, SearchResult};

use crate::auth::{AuthManager, DEFAULT_SCOPE};
use crate::endpoints::Endpoints;
use crate::executor::{HttpRequest, RequestExecutor};

/// Issues search requests against the per-country search endpoint.
pub struct SearchClient {
    auth: Arc<AuthManager>,
    executor: Arc<RequestExecutor>,
    endpoints: Endpoints,
}

impl SearchClient {
    pub fn new(
        auth: Arc<AuthManager>,
        executor: Arc<RequestExecutor>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            auth,
            executor,
            endpoints,
        }
    }

    /// Fetch one page of results.
    ///
    /// `numPage` in `params` selects the page; the provider defaults to 1.
    pub async fn search(&self, country: &str, params: &SearchParams) -> Result<SearchResult> {
        let url = self.endpoints.search_url(country)?;
        let token = self.auth.get_token(Some(DEFAULT_SCOPE), false).await?;
        let (boundary, body) = encode_multipart(params);

        let request = HttpRequest::post(url)
            .header(AUTHORIZATION, &format!("Bearer {}", token))?
            .header(
                CONTENT_TYPE,
                &format!("multipart/form-data; boundary={}", boundary),
            )?
            .body(body);

        match self.executor.execute(&request).await? {
            Value::Object(fields) => Ok(SearchResult::from_map(fields)),
            other => Err(Error::InvalidResponse(format!(
                "search endpoint returned {} instead of an object",
                other
            ))),
        }
    }

    /// Fetch several pages and merge them into one result.
    ///
    /// Page 1 is always fetched first to learn `totalPages`. Then pages
    /// `2..=n` are fetched in order, where `n` is `pages` (or the reported
    /// total) clamped to `1..=totalPages`. The result is page 1 with
    /// `elementList` replaced by the concatenation of every page and
    /// `totalPages` replaced by `n`.
    ///
    /// # Errors
    /// - Any page failure aborts the whole call; no partial result is returned
    pub async fn search_all(
        &self,
        country: &str,
        pages: Option<u32>,
        params: &SearchParams,
    ) -> Result<SearchResult> {
        let mut params = params.clone();
        params.set(keys::NUM_PAGE, 1i64);

        let mut first = self.search(country, &params).await?;
        let reported = first.total_pages()?;
        let count = page_count(pages, reported);
        debug!(reported, fetching = count, "aggregating search pages");

        let mut elements = first.take_elements();
        for page in 2..=count {
            params.set(keys::NUM_PAGE, page);
            let mut result = self.search(country, &params).await?;
            elements.extend(result.take_elements());
        }

        first.set_pages(elements, count);
        Ok(first)
    }
}

/// Pages to fetch: the request (or the reported total) capped to the total,
/// and never less than one.
pub fn page_count(requested: Option<u32>, total_pages: i64) -> i64 {
    let wanted = requested.map(i64::from).unwrap_or(total_pages);
    wanted.min(total_pages).max(1)
}

/// Encode `params` as `multipart/form-data` with a random boundary.
///
/// Returns the boundary and the body.
pub fn encode_multipart(params: &SearchParams) -> (String, Vec<u8>) {
    let boundary = format!("----idealista-cli-{}", Uuid::new_v4().simple());
    let body = encode_multipart_with_boundary(params, &boundary);
    (boundary, body)
}

/// Encode `params` as `multipart/form-data` using `boundary`.
///
/// Absent values are skipped entirely.
pub fn encode_multipart_with_boundary(params: &SearchParams, boundary: &str) -> Vec<u8> {
    let mut lines: Vec<String> = Vec::new();
    for (key, value) in params.fields() {
        lines.push(format!("--{}", boundary));
        lines.push(format!("Content-Disposition: form-data; name=\"{}\"", key));
        lines.push(String::new());
        lines.push(value.to_form_value());
    }
    lines.push(format!("--{}--", boundary));
    lines.push(String::new());
    lines.join("\r\n").into_bytes()
}
