//! Web server module
//!
//! Provides the HTTP API for Logfolio cover search and image derivatives.

mod error;
mod handlers;
mod identity;
mod routes;
mod state;

pub use error::{ApiError, ErrorEnvelope};
pub use handlers::{CoverItem, CoverSearchParams, CoverSearchResponse};
pub use identity::{UserId, DEFAULT_USER_ID};
pub use routes::create_router;
pub use state::AppState;
