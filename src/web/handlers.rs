//! HTTP request handlers

use super::error::ApiError;
use super::identity::UserId;
use super::state::AppState;
use crate::results::{MediaKind, SearchResult};
use crate::search::{KindFilter, ProviderFilter, SearchRequest};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Query parameters for cover search
#[derive(Debug, Default, Deserialize)]
pub struct CoverSearchParams {
    /// Search query
    pub q: Option<String>,
    /// Media kind filter
    #[serde(alias = "type")]
    pub kind: Option<String>,
    /// Page number, 1-indexed
    pub page: Option<String>,
    /// Provider restriction
    #[serde(alias = "source")]
    pub provider: Option<String>,
}

impl CoverSearchParams {
    /// Validate into a search request
    pub fn into_request(self, max_page: u32) -> Result<SearchRequest, ApiError> {
        let query = match self.q {
            Some(q) if !q.trim().is_empty() => q.trim().to_string(),
            _ => return Err(ApiError::BadRequest("query parameter q is required".to_string())),
        };

        let kind_filter = match self.kind.as_deref() {
            Some(kind) => kind.parse()?,
            None => KindFilter::default(),
        };

        let provider_filter = match self.provider.as_deref() {
            Some(provider) => provider.parse()?,
            None => ProviderFilter::default(),
        };

        let page = match self.page.as_deref() {
            Some(page) => match page.trim().parse::<u32>() {
                Ok(page) if (1..=max_page).contains(&page) => page,
                _ => {
                    return Err(ApiError::BadRequest(format!(
                        "page must be between 1 and {}",
                        max_page
                    )))
                }
            },
            None => 1,
        };

        Ok(SearchRequest::new(query)
            .with_kind(kind_filter)
            .with_page(page)
            .with_provider(provider_filter))
    }
}

/// Cover search response
#[derive(Debug, Serialize)]
pub struct CoverSearchResponse {
    pub data: Vec<CoverItem>,
    pub has_next_page: bool,
}

/// One cover candidate
#[derive(Debug, Serialize)]
pub struct CoverItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    pub title_native: String,
    pub url: String,
}

impl From<SearchResult> for CoverItem {
    fn from(result: SearchResult) -> Self {
        Self {
            kind: result.kind,
            title: result.title,
            title_native: result.alt_title,
            url: result.image_url,
        }
    }
}

/// API root handler
pub async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Logfolio API",
        "version": crate::VERSION
    }))
}

/// Cover search handler
pub async fn cover_search(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    Query(params): Query<CoverSearchParams>,
) -> Result<Json<CoverSearchResponse>, ApiError> {
    let request = params.into_request(state.settings.search.max_page)?;
    debug!(
        "Cover search '{}' ({:?}, page {}) for {}",
        request.query,
        request.kind_filter,
        request.page,
        user.as_str()
    );

    let response = state.search.aggregate(&request).await;

    Ok(Json(CoverSearchResponse {
        data: response.results.into_iter().map(CoverItem::from).collect(),
        has_next_page: response.has_more,
    }))
}

/// WebP derivative of an uploaded image
pub async fn serve_webp(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.derivatives.get_or_create(&path).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/webp"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        bytes,
    )
        .into_response())
}

/// Provider statistics handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "instance_name": state.instance_name(),
        "providers": state.search.registry().names(),
        "total_searches": state.metrics.total_searches(),
        "provider_stats": state.metrics.provider_stats(),
    }))
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        q: &str,
        kind: Option<&str>,
        page: Option<&str>,
        provider: Option<&str>,
    ) -> CoverSearchParams {
        CoverSearchParams {
            q: Some(q.to_string()),
            kind: kind.map(str::to_string),
            page: page.map(str::to_string),
            provider: provider.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        let request = params(" spy family ", None, None, None).into_request(100).unwrap();
        assert_eq!(request.query, "spy family");
        assert_eq!(request.kind_filter, KindFilter::AnimeOrManga);
        assert_eq!(request.provider_filter, ProviderFilter::Any);
        assert_eq!(request.page, 1);
    }

    #[test]
    fn test_invalid_params() {
        assert!(CoverSearchParams::default().into_request(100).is_err());
        assert!(params("  ", None, None, None).into_request(100).is_err());
        assert!(params("x", Some("music"), None, None).into_request(100).is_err());
        assert!(params("x", None, Some("0"), None).into_request(100).is_err());
        assert!(params("x", None, Some("abc"), None).into_request(100).is_err());
        assert!(params("x", None, Some("101"), None).into_request(100).is_err());
        assert!(params("x", None, None, Some("anilist")).into_request(100).is_err());
    }

    #[test]
    fn test_item_shape() {
        let result = SearchResult::new(
            MediaKind::Manga,
            "间谍过家家",
            "SPY×FAMILY",
            "https://lain.bgm.tv/pic/cover/l/a.jpg",
        )
        .unwrap();
        let json = serde_json::to_value(CoverItem::from(result)).unwrap();
        assert_eq!(json["type"], "manga");
        assert_eq!(json["title_native"], "SPY×FAMILY");
        assert_eq!(json["url"], "https://lain.bgm.tv/pic/cover/l/a.jpg");
    }
}
