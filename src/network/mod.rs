//! HTTP networking module
//!
//! Provides the outgoing HTTP client used by the cover search providers.

mod client;

pub use client::HttpClient;
