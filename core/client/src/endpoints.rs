//! Idealista API endpoint URLs.

use url::Url;

use idealista_common::{Error, Result};

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.idealista.com";
/// Version segment of the search API path.
pub const SEARCH_API_VERSION: &str = "3.5";

/// Resolves endpoint URLs against a base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Create endpoints rooted at `base_url`.
    ///
    /// # Errors
    /// - `InvalidInput` if `base_url` is not an absolute http(s) URL
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| Error::InvalidInput(format!("Invalid base URL {}: {}", base_url, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::InvalidInput(format!(
                "Base URL must be http or https: {}",
                base_url
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    /// Endpoints of the production API.
    pub fn production() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL)
    }

    /// `POST <base>/oauth/token`
    pub fn token_url(&self) -> Result<Url> {
        self.join("oauth/token")
    }

    /// `POST <base>/3.5/<country>/search`
    ///
    /// # Errors
    /// - `InvalidInput` unless `country` is a short alphabetic code such as `es`
    pub fn search_url(&self, country: &str) -> Result<Url> {
        if country.is_empty() || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidInput(format!(
                "Invalid country code: {:?}",
                country
            )));
        }
        self.join(&format!(
            "{}/{}/search",
            SEARCH_API_VERSION,
            country.to_ascii_lowercase()
        ))
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::InvalidInput(format!("Invalid endpoint path {}: {}", path, e)))
    }
}
