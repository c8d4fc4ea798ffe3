//! Upstream fetchers
//!
//! Thin async wrappers around third-party JSON APIs. Every call is one
//! request, one status check and one JSON decode. Non-200 responses are
//! turned into a "no result" value instead of an error; transport and
//! decode failures propagate.

mod apple;
pub mod cache;
mod canister;
mod chat;
mod scam;
mod status;

pub use chat::ChatGptCredentials;

use crate::config::get_fetch_cache_max_capacity;
use cache::TtlCache;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Lifetime of cached firmware, catalog and scam-list responses.
pub const LONG_CACHE_TTL: Duration = Duration::from_secs(3600);
/// Lifetime of cached status-page responses.
pub const STATUS_CACHE_TTL: Duration = Duration::from_secs(600);

/// Errors that escape the fetch layer
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or body-read failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The upstream answered 200 with a body that is not JSON
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),
    /// A fetcher was called without the configuration it needs
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
    /// An upstream base URL cannot carry path segments
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),
}

/// Time-to-live of each cached fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// `appledb_catalog`
    pub appledb_catalog: Duration,
    /// `ipsw_firmware_info`, per version
    pub ipsw_firmware_info: Duration,
    /// `status_components`
    pub status_components: Duration,
    /// `status_incidents`
    pub status_incidents: Duration,
    /// `fetch_repositories`
    pub repositories: Duration,
    /// `scam_urls`
    pub scam_urls: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            appledb_catalog: LONG_CACHE_TTL,
            ipsw_firmware_info: LONG_CACHE_TTL,
            status_components: STATUS_CACHE_TTL,
            status_incidents: STATUS_CACHE_TTL,
            repositories: LONG_CACHE_TTL,
            scam_urls: LONG_CACHE_TTL,
        }
    }
}

impl CacheTtls {
    /// Same lifetime for every cache.
    #[must_use]
    pub const fn uniform(ttl: Duration) -> Self {
        Self {
            appledb_catalog: ttl,
            ipsw_firmware_info: ttl,
            status_components: ttl,
            status_incidents: ttl,
            repositories: ttl,
            scam_urls: ttl,
        }
    }
}

/// Base URLs of every upstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// appledb API (`/main.json`)
    pub appledb: String,
    /// ipsw.me API (`/v4/ipsw/{version}`)
    pub ipsw: String,
    /// Statuspage instance (`/api/v2/...`)
    pub status_page: String,
    /// Canister package index (`/v1/community/...`)
    pub canister: String,
    /// Full URL of the anti-scam JSON list
    pub scam_list: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            appledb: "https://api.appledb.dev".to_string(),
            ipsw: "https://api.ipsw.me".to_string(),
            status_page: "https://discordstatus.com".to_string(),
            canister: "https://api.canister.me".to_string(),
            scam_list: "https://raw.githubusercontent.com/SlimShadyIAm/Anti-Scam-Json-List/main/antiscam.json"
                .to_string(),
        }
    }
}

impl Endpoints {
    /// Points every upstream at one host, e.g. a local mirror.
    ///
    /// The scam list is served from `{base}/antiscam.json`.
    #[must_use]
    pub fn all_at(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            appledb: base.clone(),
            ipsw: base.clone(),
            status_page: base.clone(),
            canister: base.clone(),
            scam_list: format!("{base}/antiscam.json"),
        }
    }
}

/// Appends percent-encoded path segments to `base`.
pub(crate) fn endpoint_url_with_segments(base: &str, segments: &[&str]) -> Result<Url, FetchError> {
    let mut url =
        Url::parse(base).map_err(|e| FetchError::InvalidEndpoint(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| FetchError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn endpoint_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Process-wide HTTP client shared by every fetcher.
///
/// Construct once at startup and hand out behind an `Arc`; all requests go
/// through the same connection pool and cookie store.
pub struct FetchClient {
    client: reqwest::Client,
    endpoints: Endpoints,
    chatgpt: Option<ChatGptCredentials>,
    appledb_cache: TtlCache<(), Value>,
    ipsw_cache: TtlCache<String, Value>,
    components_cache: TtlCache<(), Value>,
    incidents_cache: TtlCache<(), Value>,
    repositories_cache: TtlCache<(), Value>,
    scam_urls_cache: TtlCache<(), Value>,
}

impl FetchClient {
    /// Create a client talking to the production upstreams.
    #[must_use]
    pub fn new(chatgpt: Option<ChatGptCredentials>) -> Self {
        Self::with_endpoints(Endpoints::default(), CacheTtls::default(), chatgpt)
    }

    /// Create a client talking to the given upstreams with the given cache lifetimes.
    #[must_use]
    pub fn with_endpoints(
        endpoints: Endpoints,
        ttls: CacheTtls,
        chatgpt: Option<ChatGptCredentials>,
    ) -> Self {
        let client = match reqwest::Client::builder().cookie_store(true).build() {
            Ok(client) => client,
            Err(_) => reqwest::Client::new(),
        };
        let capacity = get_fetch_cache_max_capacity();

        Self {
            client,
            endpoints,
            chatgpt,
            appledb_cache: TtlCache::new("appledb_catalog", ttls.appledb_catalog, capacity),
            ipsw_cache: TtlCache::new("ipsw_firmware_info", ttls.ipsw_firmware_info, capacity),
            components_cache: TtlCache::new("status_components", ttls.status_components, capacity),
            incidents_cache: TtlCache::new("status_incidents", ttls.status_incidents, capacity),
            repositories_cache: TtlCache::new("fetch_repositories", ttls.repositories, capacity),
            scam_urls_cache: TtlCache::new("scam_urls", ttls.scam_urls, capacity),
        }
    }

    /// Upstreams this client talks to.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Sends the request and decodes the body when the status is 200.
    ///
    /// Any other status yields `Ok(None)`.
    async fn json_if_ok(&self, request: RequestBuilder) -> Result<Option<Value>, FetchError> {
        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            debug!(url = %response.url(), status = %status, "Upstream returned no result");
            return Ok(None);
        }

        let body = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_slashes() {
        assert_eq!(
            endpoint_url("https://api.example/", "/v4/ipsw/16.0"),
            "https://api.example/v4/ipsw/16.0"
        );
        assert_eq!(
            endpoint_url("https://api.example", "main.json"),
            "https://api.example/main.json"
        );
    }

    #[test]
    fn test_path_segments_are_percent_encoded() -> Result<(), FetchError> {
        let url = endpoint_url_with_segments("https://api.example/", &["v4", "ipsw", "16.0?x=1"])?;
        assert_eq!(url.as_str(), "https://api.example/v4/ipsw/16.0%3Fx=1");
        assert_eq!(url.query(), None);

        let url = endpoint_url_with_segments("https://api.example", &["v4", "ipsw", "16.0#frag"])?;
        assert_eq!(url.as_str(), "https://api.example/v4/ipsw/16.0%23frag");
        assert_eq!(url.fragment(), None);

        let url = endpoint_url_with_segments("https://api.example", &["v4", "ipsw", "../16.0"])?;
        assert_eq!(url.path(), "/v4/ipsw/..%2F16.0");
        Ok(())
    }

    #[test]
    fn test_unusable_base_is_an_error() {
        assert!(matches!(
            endpoint_url_with_segments("not a url", &["x"]),
            Err(FetchError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            endpoint_url_with_segments("mailto:ops@example.com", &["x"]),
            Err(FetchError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_default_ttls_per_endpoint() {
        let ttls = CacheTtls::default();
        assert_eq!(ttls.appledb_catalog, Duration::from_secs(3600));
        assert_eq!(ttls.ipsw_firmware_info, Duration::from_secs(3600));
        assert_eq!(ttls.repositories, Duration::from_secs(3600));
        assert_eq!(ttls.scam_urls, Duration::from_secs(3600));
        assert_eq!(ttls.status_components, Duration::from_secs(600));
        assert_eq!(ttls.status_incidents, Duration::from_secs(600));
    }

    #[test]
    fn test_all_at_redirects_every_upstream() {
        let endpoints = Endpoints::all_at("http://127.0.0.1:8080/");
        assert_eq!(endpoints.appledb, "http://127.0.0.1:8080");
        assert_eq!(endpoints.canister, "http://127.0.0.1:8080");
        assert_eq!(endpoints.scam_list, "http://127.0.0.1:8080/antiscam.json");
        assert_ne!(endpoints, Endpoints::default());
    }
}
