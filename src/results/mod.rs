//! Result types and container for cover search results
//!
//! This module defines the normalized result schema shared by every provider.

mod container;
mod types;

pub use container::ResultContainer;
pub use types::*;
