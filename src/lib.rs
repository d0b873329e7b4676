//! Logfolio: cover search and image derivatives for a personal media log
//!
//! Searches anime, manga and game covers on several metadata services at
//! once and serves uploaded covers as cached WebP derivatives.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod network;
pub mod providers;
pub mod results;
pub mod search;
pub mod web;

pub use cache::{CacheError, DerivativeCache};
pub use config::Settings;
pub use providers::Provider;
pub use results::{MediaKind, ResultContainer, SearchResult};
pub use search::{AggregatedResponse, SearchAggregator, SearchRequest};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for provider requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 12;

/// Maximum timeout that can be set
pub const MAX_TIMEOUT: u64 = 15;
