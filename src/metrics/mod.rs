//! Metrics collection module
//!
//! Tracks per-provider search counts, errors and response times. The
//! aggregator reports into any [`SearchObserver`]; [`Metrics`] is the
//! in-memory implementation served by `/api/stats`.

use crate::results::ProviderFailure;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Sink for aggregation events
pub trait SearchObserver: Send + Sync {
    /// A search fanned out to `providers`
    fn on_search(&self, query: &str, providers: &[String]);

    /// A provider answered in time
    fn on_success(&self, provider: &str, time_ms: u64, result_count: usize);

    /// A provider failed or timed out
    fn on_failure(&self, failure: &ProviderFailure, time_ms: u64);
}

/// Observer that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {
    fn on_search(&self, _query: &str, _providers: &[String]) {}
    fn on_success(&self, _provider: &str, _time_ms: u64, _result_count: usize) {}
    fn on_failure(&self, _failure: &ProviderFailure, _time_ms: u64) {}
}

/// Response times kept per provider for the rolling average
const RESPONSE_WINDOW: usize = 100;

/// Counters for one provider
#[derive(Debug, Default)]
struct ProviderCounters {
    searches: u64,
    successes: u64,
    errors: u64,
    response_times: VecDeque<u64>,
}

impl ProviderCounters {
    fn stats(&self) -> ProviderStats {
        let answered = self.successes + self.errors;
        let avg_response_time = (!self.response_times.is_empty()).then(|| {
            self.response_times.iter().sum::<u64>() / self.response_times.len() as u64
        });

        ProviderStats {
            searches: self.searches,
            errors: self.errors,
            avg_response_time,
            reliability: if answered == 0 {
                100.0
            } else {
                self.successes as f64 / answered as f64 * 100.0
            },
        }
    }
}

/// In-memory metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    total_searches: AtomicU64,
    providers: RwLock<HashMap<String, ProviderCounters>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches fanned out since startup
    pub fn total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    /// Snapshot of every provider that has been searched
    pub fn provider_stats(&self) -> HashMap<String, ProviderStats> {
        self.providers
            .read()
            .unwrap()
            .iter()
            .map(|(name, counters)| (name.clone(), counters.stats()))
            .collect()
    }

    fn update(&self, provider: &str, f: impl FnOnce(&mut ProviderCounters)) {
        let mut providers = self.providers.write().unwrap();
        f(providers.entry(provider.to_string()).or_default());
    }
}

impl SearchObserver for Metrics {
    fn on_search(&self, _query: &str, providers: &[String]) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
        for provider in providers {
            self.update(provider, |c| c.searches += 1);
        }
    }

    fn on_success(&self, provider: &str, time_ms: u64, _result_count: usize) {
        self.update(provider, |c| {
            c.successes += 1;
            if c.response_times.len() == RESPONSE_WINDOW {
                c.response_times.pop_front();
            }
            c.response_times.push_back(time_ms);
        });
    }

    fn on_failure(&self, failure: &ProviderFailure, _time_ms: u64) {
        self.update(&failure.provider, |c| c.errors += 1);
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub searches: u64,
    pub errors: u64,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}
