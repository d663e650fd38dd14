//! Backend location and transport settings.
//!
//! The base URL is read from `BRITMETRICS_API_URL`. When it is unset, debug
//! builds talk to the local development server and release builds use an
//! empty (same-origin) prefix, which a native client cannot resolve and
//! therefore must be overridden.

use std::time::Duration;

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "BRITMETRICS_API_URL";

/// Environment variable overriding the request timeout in seconds.
pub const API_TIMEOUT_ENV: &str = "BRITMETRICS_API_TIMEOUT_SECS";

/// Base URL of the local development backend.
pub const DEV_API_URL: &str = "http://localhost:8000";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to reach the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL without a trailing slash (may be empty for same-origin).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Creates a config for `base_url` with the default timeout.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builds the config from the environment.
    ///
    /// An explicitly set `BRITMETRICS_API_URL` wins even when empty.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(API_URL_ENV).unwrap_or_else(|_| default_base_url().to_string());

        let timeout = std::env::var(API_TIMEOUT_ENV)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        log::debug!("API base URL: {base_url:?}, timeout: {timeout:?}");

        Self {
            base_url: normalize_base_url(&base_url),
            timeout,
        }
    }

    /// Joins `path` (which starts with `/`) onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(default_base_url())
    }
}

/// The base URL used when no override is configured.
#[must_use]
pub const fn default_base_url() -> &'static str {
    if cfg!(debug_assertions) { DEV_API_URL } else { "" }
}

/// Trims whitespace and a single trailing slash.
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}
