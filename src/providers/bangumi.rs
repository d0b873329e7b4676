//! Bangumi (bgm.tv) subject search
//!
//! Uses the legacy `search/subject` endpoint, which takes the keyword in the
//! path and a single subject type code. The endpoint reports no usable
//! total, so a full page is taken as the hint that another page exists.

use super::traits::*;
use crate::config::ProviderConfig;
use crate::results::{MediaKind, SearchResult};
use crate::search::KindFilter;
use anyhow::Result as AnyhowResult;
use governor::DefaultDirectRateLimiter;
use serde::Deserialize;
use tracing::debug;

const DEFAULT_API_URL: &str = "https://api.bgm.tv";
const DEFAULT_PAGE_SIZE: u32 = 24;
const DEFAULT_RATE_LIMIT: u32 = 5;

/// Bangumi subject type codes
const TYPE_BOOK: i64 = 1;
const TYPE_ANIME: i64 = 2;
const TYPE_GAME: i64 = 4;

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    list: Option<Vec<Subject>>,
}

#[derive(Debug, Deserialize)]
struct Subject {
    #[serde(rename = "type", default)]
    subject_type: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    name_cn: Option<String>,
    #[serde(default)]
    images: Option<SubjectImages>,
}

#[derive(Debug, Deserialize)]
struct SubjectImages {
    #[serde(default)]
    large: Option<String>,
    #[serde(default)]
    common: Option<String>,
    #[serde(default)]
    medium: Option<String>,
}

/// Bangumi cover search provider
pub struct Bangumi {
    api_url: String,
    page_size: u32,
    timeout: f64,
    limiter: DefaultDirectRateLimiter,
}

impl Bangumi {
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

    /// Map a subject type code onto a media kind.
    ///
    /// Music (3), real-life (6) and unknown codes have no cover category
    /// here and are skipped.
    fn kind_for(code: i64) -> Option<MediaKind> {
        match code {
            TYPE_BOOK => Some(MediaKind::Manga),
            TYPE_ANIME => Some(MediaKind::Anime),
            TYPE_GAME => Some(MediaKind::Game),
            _ => None,
        }
    }

    fn code_for(kind: MediaKind) -> i64 {
        match kind {
            MediaKind::Manga => TYPE_BOOK,
            MediaKind::Anime => TYPE_ANIME,
            MediaKind::Game => TYPE_GAME,
        }
    }

    fn subject_request(&self, params: &RequestParams, kind: Option<MediaKind>) -> ProviderRequest {
        let url = format!(
            "{}/search/subject/{}",
            self.api_url,
            urlencoding::encode(params.query.trim())
        );
        let mut request = ProviderRequest::get(url)
            .param("responseGroup", "small")
            .param("start", params.offset(self.page_size))
            .param("max_results", self.page_size);
        if let Some(kind) = kind {
            request = request
                .param("type", Self::code_for(kind))
                .scoped(kind);
        }
        request
    }

    fn convert(subject: Subject, filter: KindFilter) -> Option<SearchResult> {
        let kind = Self::kind_for(subject.subject_type?)?;
        if !filter.allows(kind) {
            return None;
        }

        let images = subject.images?;
        let image_url = first_non_empty([
            images.large.as_deref(),
            images.common.as_deref(),
            images.medium.as_deref(),
        ])?;

        let (title, alt_title) =
            localized_titles(subject.name_cn.as_deref(), subject.name.as_deref());

        SearchResult::new(kind, title, alt_title, https_url(image_url))
    }
}

impl Default for Bangumi {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for Bangumi {
    fn name(&self) -> &str {
        "bangumi"
    }

    fn kinds(&self) -> &[MediaKind] {
        &[MediaKind::Anime, MediaKind::Manga, MediaKind::Game]
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

    fn accepts_status(&self, status: u16) -> bool {
        // The legacy endpoint answers 404 when nothing matches
        status == 404 || (200..300).contains(&status)
    }

    fn requests(&self, params: &RequestParams) -> AnyhowResult<Vec<ProviderRequest>> {
        if params.query.trim().is_empty() {
            return Err(anyhow::anyhow!("empty query"));
        }

        // Every kind: one untyped search, unmapped subject types are dropped.
        // Otherwise one typed search per requested kind.
        let requests = match params.kinds {
            KindFilter::Any => vec![self.subject_request(params, None)],
            filter => filter
                .kinds()
                .iter()
                .map(|kind| self.subject_request(params, Some(*kind)))
                .collect(),
        };
        Ok(requests)
    }

    fn response(
        &self,
        params: &RequestParams,
        responses: Vec<ProviderResponse>,
    ) -> AnyhowResult<ProviderPage> {
        let mut page = ProviderPage::empty();

        for response in responses {
            if response.status == 404 {
                debug!("bangumi: no match for {:?} ({:?})", params.query, response.scope);
                continue;
            }
            if !response.is_success() {
                return Err(anyhow::anyhow!("HTTP error: {}", response.status));
            }

            let payload: SearchPayload = response
                .json()
                .map_err(|e| anyhow::anyhow!("Failed to parse JSON: {}", e))?;
            let subjects = payload.list.unwrap_or_default();

            if subjects.len() as u32 >= self.page_size {
                page.more = true;
            }

            page.results.extend(
                subjects
                    .into_iter()
                    .filter_map(|subject| Self::convert(subject, params.kinds)),
            );
        }

        Ok(page)
    }

    fn init(&mut self, config: &ProviderConfig) -> AnyhowResult<()> {
        if let Some(api_url) = &config.api_url {
            self.api_url = api_url.trim_end_matches('/').to_string();
        }
        if let Some(page_size) = config.page_size {
            // The endpoint caps max_results at 25
            if page_size == 0 || page_size > 25 {
                return Err(anyhow::anyhow!(
                    "bangumi page_size must be within 1..=25, got {}",
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

/// Bangumi still hands out some `http://` image links
fn https_url(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}
