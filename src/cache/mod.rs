//! Image derivative cache for Logfolio
//!
//! Uploaded covers are served as WebP derivatives converted on first
//! request and kept on disk next to the uploads.

mod derivative;
mod key;
mod store;
mod transcode;

pub use derivative::DerivativeCache;
pub use key::{cache_key, validate_identity, DERIVATIVE_EXTENSION};
pub use store::{SourceStore, UploadDir};
pub use transcode::{Transcoder, WebpTranscoder};

use thiserror::Error;

/// Derivative cache failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("invalid source path {0}")]
    InvalidIdentity(String),

    #[error("source not found: {0}")]
    NotFound(String),

    #[error("could not decode source image: {0}")]
    Decode(String),

    #[error("could not encode derivative: {0}")]
    Encode(String),

    #[error("storage error: {0}")]
    Io(String),

    /// The derivative was produced but could not be written to the cache
    #[error("could not persist derivative: {0}")]
    Persist(String),
}

impl CacheError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidIdentity(_) => 400,
            Self::NotFound(_) => 404,
            Self::Decode(_) | Self::Encode(_) | Self::Io(_) | Self::Persist(_) => 500,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(error.to_string()),
            _ => Self::Io(error.to_string()),
        }
    }
}
