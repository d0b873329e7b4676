//! Jikan (unofficial MyAnimeList API) search
//!
//! Anime and manga live behind separate endpoints, each paginated on its
//! own. A search for both kinds calls both and reports more results when
//! either endpoint has a next page.

use super::traits::*;
use crate::config::ProviderConfig;
use crate::results::{MediaKind, SearchResult};
use anyhow::Result as AnyhowResult;
use governor::DefaultDirectRateLimiter;
use serde::Deserialize;

const DEFAULT_API_URL: &str = "https://api.jikan.moe/v4";
const DEFAULT_PAGE_SIZE: u32 = 12;
// Jikan allows 3 requests per second per client
const DEFAULT_RATE_LIMIT: u32 = 3;

#[derive(Debug, Deserialize)]
struct JikanList {
    #[serde(default)]
    data: Vec<Entry>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    title_english: Option<String>,
    #[serde(default)]
    title_japanese: Option<String>,
    #[serde(default)]
    images: Option<Images>,
}

#[derive(Debug, Deserialize)]
struct Images {
    #[serde(default)]
    jpg: Option<ImageUrls>,
}

#[derive(Debug, Deserialize)]
struct ImageUrls {
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    small_image_url: Option<String>,
    #[serde(default)]
    large_image_url: Option<String>,
}

/// Jikan cover search provider
pub struct Jikan {
    api_url: String,
    page_size: u32,
    timeout: f64,
    limiter: DefaultDirectRateLimiter,
}

impl Jikan {
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: 12.0,
            limiter: per_second_limiter(DEFAULT_RATE_LIMIT),
        }
    }

    /// Point the provider at a different API root
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(kind: MediaKind) -> Option<&'static str> {
        match kind {
            MediaKind::Anime => Some("anime"),
            MediaKind::Manga => Some("manga"),
            MediaKind::Game => None,
        }
    }

    fn convert(entry: Entry, kind: MediaKind) -> Option<SearchResult> {
        let jpg = entry.images?.jpg?;
        let image_url = first_non_empty([
            jpg.large_image_url.as_deref(),
            jpg.image_url.as_deref(),
            jpg.small_image_url.as_deref(),
        ])?;

        let localized = first_non_empty([entry.title_english.as_deref(), entry.title.as_deref()]);
        let (title, alt_title) = localized_titles(localized, entry.title_japanese.as_deref());

        SearchResult::new(kind, title, alt_title, image_url)
    }
}

impl Default for Jikan {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for Jikan {
    fn name(&self) -> &str {
        "jikan"
    }

    fn kinds(&self) -> &[MediaKind] {
        &[MediaKind::Anime, MediaKind::Manga]
    }

    fn timeout(&self) -> f64 {
        self.timeout
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn rate_limiter(&self) -> Option<&DefaultDirectRateLimiter> {
        Some(&self.limiter)
    }

    fn requests(&self, params: &RequestParams) -> AnyhowResult<Vec<ProviderRequest>> {
        let query = params.query.trim();
        if query.is_empty() {
            return Err(anyhow::anyhow!("empty query"));
        }

        let requests: Vec<_> = params
            .kinds
            .kinds()
            .iter()
            .filter_map(|kind| {
                let endpoint = Self::endpoint(*kind)?;
                Some(
                    ProviderRequest::get(format!("{}/{}", self.api_url, endpoint))
                        .param("q", query)
                        .param("page", params.pageno)
                        .param("limit", self.page_size)
                        .scoped(*kind),
                )
            })
            .collect();

        if requests.is_empty() {
            return Err(anyhow::anyhow!("no jikan endpoint for {:?}", params.kinds));
        }
        Ok(requests)
    }

    fn response(
        &self,
        _params: &RequestParams,
        responses: Vec<ProviderResponse>,
    ) -> AnyhowResult<ProviderPage> {
        let mut page = ProviderPage::empty();

        for response in responses {
            if !response.is_success() {
                return Err(anyhow::anyhow!("HTTP error: {}", response.status));
            }
            let kind = response
                .scope
                .ok_or_else(|| anyhow::anyhow!("response without endpoint scope"))?;

            let list: JikanList = response
                .json()
                .map_err(|e| anyhow::anyhow!("Failed to parse JSON: {}", e))?;

            if list.pagination.map(|p| p.has_next_page).unwrap_or(false) {
                page.more = true;
            }

            page.results.extend(
                list.data
                    .into_iter()
                    .filter_map(|entry| Self::convert(entry, kind)),
            );
        }

        Ok(page)
    }

    fn init(&mut self, config: &ProviderConfig) -> AnyhowResult<()> {
        if let Some(api_url) = &config.api_url {
            self.api_url = api_url.trim_end_matches('/').to_string();
        }
        if let Some(page_size) = config.page_size {
            if page_size == 0 || page_size > 25 {
                return Err(anyhow::anyhow!(
                    "jikan page_size must be within 1..=25, got {}",
                    page_size
                ));
            }
            self.page_size = page_size;
        }
        if let Some(timeout) = config.timeout {
            self.timeout = timeout;
        }
        if let Some(rate) = config.rate_limit_per_second {
            self.limiter = per_second_limiter(rate);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::HttpClient;
    use crate::search::KindFilter;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(title: &str, english: Option<&str>, japanese: &str, large: &str) -> serde_json::Value {
        serde_json::json!({
            "mal_id": 1,
            "title": title,
            "title_english": english,
            "title_japanese": japanese,
            "images": {
                "jpg": {
                    "image_url": "https://cdn.myanimelist.net/images/anime/1/1.jpg",
                    "small_image_url": "https://cdn.myanimelist.net/images/anime/1/1t.jpg",
                    "large_image_url": large
                }
            }
        })
    }

    fn listing(entries: Vec<serde_json::Value>, has_next_page: bool) -> serde_json::Value {
        serde_json::json!({
            "pagination": { "last_visible_page": 3, "has_next_page": has_next_page },
            "data": entries
        })
    }

    fn response(body: serde_json::Value, kind: MediaKind) -> ProviderResponse {
        ProviderResponse {
            status: 200,
            text: body.to_string(),
            url: String::new(),
            scope: Some(kind),
        }
    }

    #[test]
    fn test_jikan_requests_split_by_kind() {
        let jikan = Jikan::new();
        let params = RequestParams::new("monster").with_page(2);
        let requests = jikan.requests(&params).unwrap();

        assert_eq!(requests.len(), 2);
        assert!(requests[0].url.ends_with("/v4/anime"));
        assert!(requests[1].url.ends_with("/v4/manga"));
        assert_eq!(requests[0].get_param("page"), Some("2"));
        assert_eq!(requests[0].get_param("limit"), Some("12"));
        assert_eq!(requests[1].scope, Some(MediaKind::Manga));
    }

    #[test]
    fn test_game_only_has_no_endpoint() {
        let jikan = Jikan::new();
        let params = RequestParams::new("zelda").with_kinds(KindFilter::Game);
        assert!(!jikan.supports(KindFilter::Game));
        assert!(jikan.requests(&params).is_err());
    }

    #[test]
    fn test_parse_titles_and_images() {
        let jikan = Jikan::new();
        let params = RequestParams::new("spy");
        let body = listing(
            vec![
                entry(
                    "Spy x Family",
                    Some("SPY x FAMILY"),
                    "SPY×FAMILY",
                    "https://cdn.myanimelist.net/images/anime/1/1l.jpg",
                ),
                entry("Monster", None, "モンスター", ""),
            ],
            false,
        );

        let page = jikan.response(&params, vec![response(body, MediaKind::Anime)]).unwrap();

        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].title, "SPY x FAMILY");
        assert_eq!(page.results[0].alt_title, "SPY×FAMILY");
        assert_eq!(
            page.results[0].image_url,
            "https://cdn.myanimelist.net/images/anime/1/1l.jpg"
        );
        assert_eq!(page.results[1].title, "Monster");
        assert_eq!(page.results[1].alt_title, "モンスター");
        assert_eq!(
            page.results[1].image_url,
            "https://cdn.myanimelist.net/images/anime/1/1.jpg"
        );
        assert!(!page.more);
    }

    #[test]
    fn test_more_if_either_endpoint_has_next_page() {
        let jikan = Jikan::new();
        let params = RequestParams::new("x");
        let anime = listing(vec![], false);
        let manga = listing(
            vec![entry("Berserk", None, "ベルセルク", "https://cdn.myanimelist.net/m.jpg")],
            true,
        );

        let page = jikan
            .response(
                &params,
                vec![response(anime, MediaKind::Anime), response(manga, MediaKind::Manga)],
            )
            .unwrap();

        assert!(page.more);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].kind, MediaKind::Manga);
    }

    #[test]
    fn test_entry_without_image_is_dropped() {
        let jikan = Jikan::new();
        let params = RequestParams::new("x");
        let body = serde_json::json!({
            "data": [{ "title": "Ghost", "images": { "jpg": { "image_url": null } } }]
        });

        let page = jikan.response(&params, vec![response(body, MediaKind::Anime)]).unwrap();
        assert!(page.results.is_empty());
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/anime"))
            .and(query_param("q", "frieren"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(
                vec![entry(
                    "Sousou no Frieren",
                    Some("Frieren: Beyond Journey's End"),
                    "葬送のフリーレン",
                    "https://cdn.myanimelist.net/f.jpg",
                )],
                true,
            )))
            .mount(&server)
            .await;

        let jikan = Jikan::new().with_api_url(server.uri());
        let client = HttpClient::new().unwrap();
        let params = RequestParams::new("frieren").with_kinds(KindFilter::Anime);
        let page = jikan.search(&client, &params).await.unwrap();

        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].title, "Frieren: Beyond Journey's End");
        assert!(page.more);
    }

    #[tokio::test]
    async fn test_rate_limited_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let jikan = Jikan::new().with_api_url(server.uri());
        let client = HttpClient::new().unwrap();
        let failure = jikan
            .search(&client, &RequestParams::new("frieren"))
            .await
            .unwrap_err();

        assert_eq!(failure.kind, crate::results::FailureKind::TooManyRequests);
    }
}
