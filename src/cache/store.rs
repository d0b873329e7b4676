//! Upload storage consumed by the derivative cache

use super::CacheError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Read access to stored source images
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Modification time of a source
    async fn modified(&self, identity: &str) -> Result<SystemTime, CacheError>;

    /// Full contents of a source
    async fn read(&self, identity: &str) -> Result<Vec<u8>, CacheError>;
}

/// Sources stored as files below an upload directory
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, identity: &str) -> PathBuf {
        self.root.join(identity)
    }
}

fn io_error(identity: &str, error: std::io::Error) -> CacheError {
    match error.kind() {
        ErrorKind::NotFound => CacheError::NotFound(identity.to_string()),
        _ => CacheError::Io(format!("{}: {}", identity, error)),
    }
}

#[async_trait]
impl SourceStore for UploadDir {
    async fn modified(&self, identity: &str) -> Result<SystemTime, CacheError> {
        let metadata = tokio::fs::metadata(self.resolve(identity))
            .await
            .map_err(|e| io_error(identity, e))?;

        if !metadata.is_file() {
            return Err(CacheError::NotFound(identity.to_string()));
        }

        metadata
            .modified()
            .map_err(|e| CacheError::Io(format!("{}: {}", identity, e)))
    }

    async fn read(&self, identity: &str) -> Result<Vec<u8>, CacheError> {
        tokio::fs::read(self.resolve(identity))
            .await
            .map_err(|e| io_error(identity, e))
    }
}
