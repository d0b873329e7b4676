//! Lazily populated WebP derivative cache

use super::key::{cache_key, validate_identity};
use super::store::SourceStore;
use super::transcode::Transcoder;
use super::CacheError;
use crate::config::StorageSettings;
use moka::future::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

const DEFAULT_TRANSCODE_TIMEOUT: Duration = Duration::from_secs(30);

/// Conversions currently running or just finished, by key and source mtime
type InFlight = Cache<(String, SystemTime), Arc<Vec<u8>>>;

/// Derivative cache backed by a flat directory of `.webp` files.
///
/// A cached file is fresh while its mtime is not older than the source's.
/// Files are written to a temporary name and renamed into place, so readers
/// never see a partial derivative.
pub struct DerivativeCache {
    cache_dir: PathBuf,
    store: Arc<dyn SourceStore>,
    transcoder: Arc<dyn Transcoder>,
    transcode_timeout: Duration,
    in_flight: InFlight,
}

impl DerivativeCache {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        store: Arc<dyn SourceStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            store,
            transcoder,
            transcode_timeout: DEFAULT_TRANSCODE_TIMEOUT,
            in_flight: Cache::builder()
                .max_capacity(64)
                .time_to_live(Duration::from_secs(30))
                .build(),
        }
    }

    /// Build from storage settings
    pub fn with_settings(
        settings: &StorageSettings,
        store: Arc<dyn SourceStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            transcode_timeout: Duration::try_from_secs_f64(settings.transcode_timeout)
                .unwrap_or(DEFAULT_TRANSCODE_TIMEOUT),
            in_flight: Cache::builder()
                .max_capacity(settings.inflight_capacity)
                .time_to_live(Duration::from_secs(settings.inflight_ttl))
                .build(),
            ..Self::new(settings.cache_dir(), store, transcoder)
        }
    }

    /// Set the cap on a single conversion
    pub fn with_transcode_timeout(mut self, limit: Duration) -> Self {
        self.transcode_timeout = limit;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Return the derivative for a source, converting it on a miss.
    ///
    /// The identity is validated before the store is touched. Concurrent
    /// misses for the same source version share one conversion.
    pub async fn get_or_create(&self, identity: &str) -> Result<Vec<u8>, CacheError> {
        validate_identity(identity)?;

        let key = cache_key(identity);
        let source_mtime = self.store.modified(identity).await?;
        let cache_path = self.cache_dir.join(&key);

        if let Some(bytes) = self.read_fresh(&cache_path, source_mtime).await {
            debug!("Derivative hit for {} ({})", identity, key);
            return Ok(bytes);
        }

        let bytes = self
            .in_flight
            .try_get_with(
                (key.clone(), source_mtime),
                self.populate(identity, &key, &cache_path, source_mtime),
            )
            .await
            .map_err(|e| (*e).clone())?;

        Ok(bytes.as_ref().clone())
    }

    /// Cached bytes, if present and not older than the source
    async fn read_fresh(&self, cache_path: &Path, source_mtime: SystemTime) -> Option<Vec<u8>> {
        let metadata = tokio::fs::metadata(cache_path).await.ok()?;
        let cached_mtime = metadata.modified().ok()?;
        if cached_mtime < source_mtime {
            debug!("Derivative {} is stale", cache_path.display());
            return None;
        }

        match tokio::fs::read(cache_path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Failed to read derivative {}: {}", cache_path.display(), e);
                None
            }
        }
    }

    async fn populate(
        &self,
        identity: &str,
        key: &str,
        cache_path: &Path,
        source_mtime: SystemTime,
    ) -> Result<Arc<Vec<u8>>, CacheError> {
        let source = self.store.read(identity).await?;
        let transcoder = Arc::clone(&self.transcoder);

        let task = tokio::task::spawn_blocking(move || transcoder.transcode(&source));
        let bytes = match timeout(self.transcode_timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => return Err(CacheError::Encode(format!("transcode task failed: {}", e))),
            Err(_) => {
                return Err(CacheError::Encode(format!(
                    "transcode exceeded {:?}",
                    self.transcode_timeout
                )))
            }
        };

        info!("Created derivative {} for {}", key, identity);

        if let Err(e) = self.persist(key, cache_path, &bytes, source_mtime).await {
            warn!("Serving {} without caching it: {}", identity, e);
        }

        Ok(Arc::new(bytes))
    }

    /// Write through a unique temporary file, then rename into place.
    ///
    /// The file carries the mtime of the source version it was built from,
    /// so a source replaced mid-conversion still reads as newer.
    async fn persist(
        &self,
        key: &str,
        cache_path: &Path,
        bytes: &[u8],
        source_mtime: SystemTime,
    ) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| CacheError::Persist(e.to_string()))?;

        let temp_path = self
            .cache_dir
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4()));

        let written = async {
            tokio::fs::write(&temp_path, bytes).await?;
            stamp_mtime(temp_path.clone(), source_mtime).await?;
            tokio::fs::rename(&temp_path, cache_path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(CacheError::Persist(e.to_string()));
        }

        Ok(())
    }
}

async fn stamp_mtime(path: PathBuf, mtime: SystemTime) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || {
        std::fs::File::options()
            .write(true)
            .open(&path)?
            .set_modified(mtime)
    })
    .await
    .map_err(std::io::Error::other)?
}
