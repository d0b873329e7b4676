//! Application state shared across handlers

use crate::cache::{DerivativeCache, UploadDir, WebpTranscoder};
use crate::config::Settings;
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::providers::ProviderRegistry;
use crate::search::SearchAggregator;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Cover search aggregator
    pub search: Arc<SearchAggregator>,
    /// Provider statistics
    pub metrics: Arc<Metrics>,
    /// WebP derivatives of uploaded images
    pub derivatives: Arc<DerivativeCache>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        settings: Settings,
        registry: ProviderRegistry,
        client: HttpClient,
    ) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);
        let metrics = Arc::new(Metrics::new());

        let search = SearchAggregator::new(client, Arc::new(registry), metrics.clone())
            .with_timeout(Duration::try_from_secs_f64(settings.search.default_timeout)?)
            .with_max_timeout(Duration::try_from_secs_f64(settings.search.max_timeout)?);

        let derivatives = DerivativeCache::with_settings(
            &settings.storage,
            Arc::new(UploadDir::new(&settings.storage.upload_dir)),
            Arc::new(WebpTranscoder),
        );

        Ok(Self {
            settings,
            search: Arc::new(search),
            metrics,
            derivatives: Arc::new(derivatives),
        })
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
