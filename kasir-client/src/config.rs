//! Client configuration

use std::path::PathBuf;

/// Default backend URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Held orders shown per page
pub const DEFAULT_HELD_PAGE_SIZE: usize = 10;

/// Client configuration for connecting to the POS backend
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | KASIR_API_URL | http://localhost:8000 | Backend base URL |
/// | KASIR_TOKEN | (none) | Bearer token |
/// | KASIR_TIMEOUT_SECS | 30 | Request timeout |
/// | KASIR_HELD_PAGE_SIZE | 10 | Held orders per page |
/// | KASIR_CACHE_PATH | (none, in-memory) | redb file for the held-order cache |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:8000")
    pub base_url: String,

    /// Bearer token for authentication
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Held orders per page
    pub held_page_size: usize,

    /// Held-order cache file. `None` keeps the cache in memory.
    pub cache_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: 30,
            held_page_size: DEFAULT_HELD_PAGE_SIZE,
            cache_path: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_url: lookup("KASIR_API_URL").unwrap_or(defaults.base_url),
            token: lookup("KASIR_TOKEN").filter(|t| !t.trim().is_empty()),
            timeout: lookup("KASIR_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout),
            held_page_size: lookup("KASIR_HELD_PAGE_SIZE")
                .and_then(|v| v.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.held_page_size),
            cache_path: lookup("KASIR_CACHE_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the held-order page size (at least 1)
    pub fn with_held_page_size(mut self, size: usize) -> Self {
        self.held_page_size = size.max(1);
        self
    }

    /// Persist the held-order cache at `path`
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> crate::ClientResult<super::HttpClient> {
        super::HttpClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
