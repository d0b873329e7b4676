//! Search request and response data models

use crate::results::{MediaKind, SearchResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Which media kinds a search should cover
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KindFilter {
    Anime,
    Manga,
    Game,
    /// Every kind, games included
    Any,
    /// Anime and manga only
    #[default]
    AnimeOrManga,
}

impl KindFilter {
    /// Kinds covered by this filter
    pub fn kinds(&self) -> &'static [MediaKind] {
        match self {
            Self::Anime => &[MediaKind::Anime],
            Self::Manga => &[MediaKind::Manga],
            Self::Game => &[MediaKind::Game],
            Self::Any => &[MediaKind::Anime, MediaKind::Manga, MediaKind::Game],
            Self::AnimeOrManga => &[MediaKind::Anime, MediaKind::Manga],
        }
    }

    /// Check whether a kind passes the filter
    pub fn allows(&self, kind: MediaKind) -> bool {
        self.kinds().contains(&kind)
    }
}

impl FromStr for KindFilter {
    type Err = InvalidParam;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anime" => Ok(Self::Anime),
            "manga" | "book" => Ok(Self::Manga),
            "game" => Ok(Self::Game),
            "all" | "any" => Ok(Self::Any),
            "any-media" | "both" => Ok(Self::AnimeOrManga),
            _ => Err(InvalidParam::new("kind", s)),
        }
    }
}

/// Restrict a search to one provider
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFilter {
    Bangumi,
    Jikan,
    #[default]
    Any,
}

impl ProviderFilter {
    /// Check whether a provider name passes the filter
    pub fn matches(&self, provider: &str) -> bool {
        match self {
            Self::Bangumi => provider == "bangumi",
            Self::Jikan => provider == "jikan",
            Self::Any => true,
        }
    }
}

impl FromStr for ProviderFilter {
    type Err = InvalidParam;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bangumi" | "bgm" => Ok(Self::Bangumi),
            "jikan" | "mal" | "myanimelist" => Ok(Self::Jikan),
            "any" | "both" | "all" => Ok(Self::Any),
            _ => Err(InvalidParam::new("provider", s)),
        }
    }
}

/// A request parameter outside its allowed set
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid value {value:?} for parameter {param}")]
pub struct InvalidParam {
    pub param: &'static str,
    pub value: String,
}

impl InvalidParam {
    pub fn new(param: &'static str, value: impl Into<String>) -> Self {
        Self {
            param,
            value: value.into(),
        }
    }
}

/// One cover search, immutable for the duration of an aggregation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    /// The search query string
    pub query: String,
    /// Media kinds to search
    pub kind_filter: KindFilter,
    /// Page number (1-indexed)
    pub page: u32,
    /// Provider restriction
    pub provider_filter: ProviderFilter,
}

impl SearchRequest {
    /// Create a first-page request for anime and manga on every provider
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kind_filter: KindFilter::default(),
            page: 1,
            provider_filter: ProviderFilter::default(),
        }
    }

    /// Set kind filter
    pub fn with_kind(mut self, kind_filter: KindFilter) -> Self {
        self.kind_filter = kind_filter;
        self
    }

    /// Set page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Set provider filter
    pub fn with_provider(mut self, provider_filter: ProviderFilter) -> Self {
        self.provider_filter = provider_filter;
        self
    }

    /// Check if query is empty
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty()
    }
}

/// Merged output of one aggregation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregatedResponse {
    /// Results in fixed provider order
    pub results: Vec<SearchResult>,
    /// True if any provider reported a further page
    pub has_more: bool,
}
