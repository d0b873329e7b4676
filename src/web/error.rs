//! Errors returned at the HTTP boundary

use crate::cache::CacheError;
use crate::search::InvalidParam;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// JSON error body, `{"detail": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub detail: String,
}

/// Handler failure mapped onto an HTTP status
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Cache(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl From<InvalidParam> for ApiError {
    fn from(e: InvalidParam) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::Cache(CacheError::NotFound(_)) => "Image not found".to_string(),
            Self::Cache(e) if status.is_server_error() => {
                error!("Derivative failed: {}", e);
                "Failed to convert image".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorEnvelope { detail })).into_response()
    }
}
