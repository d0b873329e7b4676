//! Provider traits and types

use crate::config::ProviderConfig;
use crate::network::HttpClient;
use crate::results::{FailureKind, MediaKind, ProviderFailure, SearchResult};
use crate::search::KindFilter;
use async_trait::async_trait;
use futures::future::join_all;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::collections::HashMap;
use std::num::NonZeroU32;
use tracing::debug;

/// One page of normalized results from a single provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderPage {
    /// Normalized results, in upstream order
    pub results: Vec<SearchResult>,
    /// Whether the provider has a further page under its own convention
    pub more: bool,
}

impl ProviderPage {
    pub fn new(results: Vec<SearchResult>, more: bool) -> Self {
        Self { results, more }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Parameters handed to a provider for one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    /// Search query string
    pub query: String,
    /// Kinds the caller asked for
    pub kinds: KindFilter,
    /// Page number (1-indexed)
    pub pageno: u32,
}

impl RequestParams {
    /// Create new request parameters
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kinds: KindFilter::default(),
            pageno: 1,
        }
    }

    pub fn with_kinds(mut self, kinds: KindFilter) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn with_page(mut self, pageno: u32) -> Self {
        self.pageno = pageno.max(1);
        self
    }

    /// Zero-based offset of the first item on this page
    pub fn offset(&self, page_size: u32) -> u32 {
        (self.pageno.max(1) - 1) * page_size
    }
}

/// HTTP GET request to be made for a provider
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// URL to request
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters, sent in insertion order
    pub params: Vec<(String, String)>,
    /// Media kind this request is scoped to, if any
    pub scope: Option<MediaKind>,
}

impl ProviderRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            params: Vec::new(),
            scope: None,
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Tag the request with the media kind it searches
    pub fn scoped(mut self, kind: MediaKind) -> Self {
        self.scope = Some(kind);
        self
    }

    /// Look up a query parameter
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response from a provider request
#[derive(Debug)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
    /// Scope copied from the originating request
    pub scope: Option<MediaKind>,
}

impl ProviderResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Main trait that all cover search providers implement.
///
/// Adapters describe their upstream calls with [`Provider::requests`] and
/// turn the raw bodies into a [`ProviderPage`] with [`Provider::response`].
/// The provided [`Provider::search`] runs the calls and classifies failures.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Media kinds this provider can search
    fn kinds(&self) -> &[MediaKind];

    /// Default timeout in seconds
    fn timeout(&self) -> f64 {
        12.0
    }

    /// Number of results requested per upstream page
    fn page_size(&self) -> u32;

    /// Outgoing rate limiter shared by all calls to this provider
    fn rate_limiter(&self) -> Option<&DefaultDirectRateLimiter> {
        None
    }

    /// Whether an upstream status carries a body the adapter can parse
    fn accepts_status(&self, status: u16) -> bool {
        (200..300).contains(&status)
    }

    /// Whether this provider has anything to offer for a kind filter
    fn supports(&self, filter: KindFilter) -> bool {
        filter.kinds().iter().any(|kind| self.kinds().contains(kind))
    }

    /// Build the HTTP requests for a search
    fn requests(&self, params: &RequestParams) -> anyhow::Result<Vec<ProviderRequest>>;

    /// Parse the HTTP responses (in request order) into one page
    fn response(
        &self,
        params: &RequestParams,
        responses: Vec<ProviderResponse>,
    ) -> anyhow::Result<ProviderPage>;

    /// Optional initialization from configuration (called once on startup)
    fn init(&mut self, _config: &ProviderConfig) -> anyhow::Result<()> {
        Ok(())
    }

    /// Run one search against the upstream service
    async fn search(
        &self,
        client: &HttpClient,
        params: &RequestParams,
    ) -> Result<ProviderPage, ProviderFailure> {
        let requests = self
            .requests(params)
            .map_err(|e| self.failure(FailureKind::InvalidRequest(e.to_string())))?;

        let calls = requests.into_iter().map(|request| async move {
            if let Some(limiter) = self.rate_limiter() {
                limiter.until_ready().await;
            }
            client.execute(request).await
        });

        let mut responses = Vec::new();
        for outcome in join_all(calls).await {
            let response = outcome.map_err(|e| self.failure(classify_transport_error(&e)))?;
            if response.is_rate_limited() {
                return Err(self.failure(FailureKind::TooManyRequests));
            }
            if !self.accepts_status(response.status) {
                return Err(self.failure(FailureKind::HttpStatus(response.status)));
            }
            debug!("{} answered {} for {}", self.name(), response.status, response.url);
            responses.push(response);
        }

        self.response(params, responses)
            .map_err(|e| self.failure(FailureKind::Parse(e.to_string())))
    }

    /// Build a failure scoped to this provider
    fn failure(&self, kind: FailureKind) -> ProviderFailure {
        ProviderFailure::new(self.name(), kind)
    }
}

/// Map a transport error from the HTTP client onto a failure kind
fn classify_transport_error(error: &anyhow::Error) -> FailureKind {
    match error.downcast_ref::<reqwest::Error>() {
        Some(e) if e.is_timeout() => FailureKind::Timeout,
        Some(e) => match e.status() {
            Some(status) => FailureKind::HttpStatus(status.as_u16()),
            None => FailureKind::Network(e.to_string()),
        },
        None => FailureKind::Network(error.to_string()),
    }
}

/// Build a per-second rate limiter, treating zero as one
pub fn per_second_limiter(per_second: u32) -> DefaultDirectRateLimiter {
    let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(rate))
}

/// First candidate that is present and not blank
pub fn first_non_empty<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Pick `(title, alt_title)` preferring the localized title.
///
/// The original title is kept as alt title only when it differs.
pub fn localized_titles(localized: Option<&str>, original: Option<&str>) -> (String, String) {
    let localized = first_non_empty([localized]);
    let original = first_non_empty([original]);
    match (localized, original) {
        (Some(loc), Some(orig)) if loc != orig => (loc.to_string(), orig.to_string()),
        (Some(loc), _) => (loc.to_string(), String::new()),
        (None, Some(orig)) => (orig.to_string(), String::new()),
        (None, None) => (String::new(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ProviderRequest::get("https://api.example/search")
            .param("q", "frieren")
            .param("page", 2)
            .header("Accept", "application/json")
            .scoped(MediaKind::Anime);

        assert_eq!(request.get_param("page"), Some("2"));
        assert_eq!(request.scope, Some(MediaKind::Anime));
        assert!(request.headers.contains_key("Accept"));
    }

    #[test]
    fn test_offset() {
        assert_eq!(RequestParams::new("x").offset(24), 0);
        assert_eq!(RequestParams::new("x").with_page(3).offset(24), 48);
    }

    #[test]
    fn test_first_non_empty() {
        assert_eq!(first_non_empty([None, Some("  "), Some("b"), Some("c")]), Some("b"));
        assert_eq!(first_non_empty([None, Some("")]), None);
    }

    #[test]
    fn test_localized_titles() {
        assert_eq!(
            localized_titles(Some("间谍过家家"), Some("SPY×FAMILY")),
            ("间谍过家家".to_string(), "SPY×FAMILY".to_string())
        );
        assert_eq!(
            localized_titles(Some("Monster"), Some("Monster")),
            ("Monster".to_string(), String::new())
        );
        assert_eq!(
            localized_titles(Some(""), Some("ぼっち・ざ・ろっく！")),
            ("ぼっち・ざ・ろっく！".to_string(), String::new())
        );
    }
}
