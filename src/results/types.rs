//! Result type definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Media kind a cover belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Anime,
    Manga,
    Game,
}

impl MediaKind {
    /// Wire name used in API responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anime => "anime",
            Self::Manga => "manga",
            Self::Game => "game",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized cover search result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    /// Media kind
    pub kind: MediaKind,
    /// Display title, localized where the provider offers it
    pub title: String,
    /// Original title, empty when it equals `title`
    pub alt_title: String,
    /// Absolute cover image URL
    pub image_url: String,
}

impl SearchResult {
    /// Build a result, or `None` when the title or image URL is unusable.
    ///
    /// Entries without a cover are never emitted.
    pub fn new(
        kind: MediaKind,
        title: impl Into<String>,
        alt_title: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Option<Self> {
        let title = title.into().trim().to_string();
        let image_url = image_url.into().trim().to_string();
        if title.is_empty() || image_url.is_empty() {
            return None;
        }
        // Relative or garbage URLs cannot be fetched by the client either
        Url::parse(&image_url).ok()?;

        let alt_title = alt_title.into().trim().to_string();
        let alt_title = if alt_title == title {
            String::new()
        } else {
            alt_title
        };

        Some(Self {
            kind,
            title,
            alt_title,
            image_url,
        })
    }
}

/// Reason a provider call produced no page
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP error: {0}")]
    HttpStatus(u16),
    #[error("too many requests")]
    TooManyRequests,
    #[error("malformed payload: {0}")]
    Parse(String),
    #[error("could not build request: {0}")]
    InvalidRequest(String),
}

/// A provider-scoped failure. Recovered by the aggregator, never surfaced to callers.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("provider {provider} failed: {kind}")]
pub struct ProviderFailure {
    pub provider: String,
    pub kind: FailureKind,
}

impl ProviderFailure {
    pub fn new(provider: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            provider: provider.into(),
            kind,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == FailureKind::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_requires_image() {
        assert!(SearchResult::new(MediaKind::Anime, "Frieren", "", "").is_none());
        assert!(SearchResult::new(MediaKind::Anime, "Frieren", "", "   ").is_none());
        assert!(SearchResult::new(MediaKind::Anime, "", "", "https://cdn.example/a.jpg").is_none());
        assert!(SearchResult::new(MediaKind::Anime, "Frieren", "", "/relative.jpg").is_none());
    }

    #[test]
    fn test_alt_title_dropped_when_equal() {
        let result = SearchResult::new(
            MediaKind::Manga,
            "Dandadan",
            " Dandadan ",
            "https://cdn.example/d.jpg",
        )
        .unwrap();
        assert_eq!(result.title, "Dandadan");
        assert!(result.alt_title.is_empty());
    }

    #[test]
    fn test_failure_display() {
        let failure = ProviderFailure::new("jikan", FailureKind::HttpStatus(503));
        assert_eq!(failure.to_string(), "provider jikan failed: HTTP error: 503");
        assert!(!failure.is_timeout());
    }
}
