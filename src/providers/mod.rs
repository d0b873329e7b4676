//! Cover search provider module
//!
//! Defines the Provider trait and provides a registry for the upstream
//! metadata services covers are searched on.

mod loader;
mod registry;
mod traits;

// Provider implementations
pub mod bangumi;
pub mod jikan;

pub use loader::ProviderLoader;
pub use registry::ProviderRegistry;
pub use traits::*;
