//! HTTP session scoped to a single target.

use std::time::Duration;

use tracing::debug;

/// Default timeout applied to every probe request (10 seconds).
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client bound to one target's base URL.
///
/// Every probe goes through a session: URLs are always formed as
/// `base_url + path`, each request carries a bounded timeout so an
/// unresponsive target cannot stall a refresh, and nothing is retried.
#[derive(Debug, Clone)]
pub struct TargetSession {
    base_url: String,
    client: reqwest::Client,
}

impl TargetSession {
    /// Create a session with the default probe timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, DEFAULT_PROBE_TIMEOUT)
    }

    /// Create a session with a custom probe timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, client })
    }

    /// The base URL all paths are joined to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path on this target.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue a GET request for a path on this target.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, reqwest::Error> {
        let url = self.url(path);
        debug!("GET {}", url);
        self.client.get(&url).send().await
    }

    /// Issue a POST request for a path on this target.
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<reqwest::Body>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let url = self.url(path);
        debug!("POST {}", url);
        self.client.post(&url).body(body).send().await
    }
}
