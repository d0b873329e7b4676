//! Search orchestration module
//!
//! Coordinates cover searches across providers, merges their pages
//! and reports each outcome to an observer.

mod executor;
mod models;

pub use executor::SearchAggregator;
pub use models::*;
