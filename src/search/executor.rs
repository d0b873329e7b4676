//! Search execution and orchestration

use super::models::{AggregatedResponse, SearchRequest};
use crate::metrics::SearchObserver;
use crate::network::HttpClient;
use crate::providers::{Provider, ProviderRegistry, RequestParams};
use crate::results::{FailureKind, ProviderFailure, ResultContainer};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Fans a cover search out to the selected providers and merges the pages
pub struct SearchAggregator {
    /// HTTP client shared by every provider
    client: HttpClient,
    /// Provider registry
    registry: Arc<ProviderRegistry>,
    /// Event sink for successes and failures
    observer: Arc<dyn SearchObserver>,
    /// Default timeout
    default_timeout: Duration,
    /// Maximum timeout
    max_timeout: Duration,
}

impl SearchAggregator {
    /// Create a new aggregator
    pub fn new(
        client: HttpClient,
        registry: Arc<ProviderRegistry>,
        observer: Arc<dyn SearchObserver>,
    ) -> Self {
        Self {
            client,
            registry,
            observer,
            default_timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT),
            max_timeout: Duration::from_secs(crate::MAX_TIMEOUT),
        }
    }

    /// Set default timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set maximum timeout
    pub fn with_max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = timeout;
        self
    }

    /// Provider registry backing this aggregator
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Search every selected provider and merge their pages in registry order.
    ///
    /// Provider failures never surface here: a failed or timed-out provider
    /// contributes no results and does not count towards `has_more`.
    pub async fn aggregate(&self, request: &SearchRequest) -> AggregatedResponse {
        self.execute(request).await.to_response()
    }

    /// Run the fan-out and return the filled container
    pub async fn execute(&self, request: &SearchRequest) -> ResultContainer {
        let providers = self
            .registry
            .selected(request.kind_filter, request.provider_filter);

        let names: Vec<String> = providers.iter().map(|p| p.name().to_string()).collect();
        let container = ResultContainer::new(names.clone());

        if request.is_empty() || providers.is_empty() {
            debug!("Nothing to search for '{}'", request.query);
            return container;
        }

        self.observer.on_search(&request.query, &names);

        let params = RequestParams::new(request.query.trim())
            .with_kinds(request.kind_filter)
            .with_page(request.page);

        let futures: Vec<_> = providers
            .into_iter()
            .enumerate()
            .map(|(slot, provider)| self.search_provider(slot, provider, &params, &container))
            .collect();

        info!(
            "Executing search '{}' on {} providers",
            request.query,
            futures.len()
        );

        // Wait for all providers to complete
        join_all(futures).await;

        container
    }

    /// Search a single provider into its slot
    async fn search_provider(
        &self,
        slot: usize,
        provider: Arc<dyn Provider>,
        params: &RequestParams,
        container: &ResultContainer,
    ) {
        let provider_name = provider.name().to_string();
        let start = Instant::now();

        let provider_timeout = Duration::from_secs_f64(
            self.registry
                .get_timeout(&provider_name, self.default_timeout.as_secs_f64())
                .min(self.max_timeout.as_secs_f64())
                .max(0.0),
        );

        debug!(
            "Searching provider {} with timeout {:?}",
            provider_name, provider_timeout
        );

        let result = timeout(provider_timeout, provider.search(&self.client, params)).await;
        let elapsed = start.elapsed();
        let time_ms = elapsed.as_millis() as u64;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderFailure::new(&provider_name, FailureKind::Timeout)),
        };

        match outcome {
            Ok(page) => {
                let result_count = page.results.len();
                container.add_page(slot, page.results, page.more);
                self.observer.on_success(&provider_name, time_ms, result_count);

                debug!(
                    "Provider {} returned {} results in {:?}",
                    provider_name, result_count, elapsed
                );
            }
            Err(failure) => {
                warn!("{} after {:?}", failure, elapsed);
                self.observer.on_failure(&failure, time_ms);
                container.add_unresponsive(slot, failure);
            }
        }
    }
}
