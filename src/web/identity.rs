//! Caller identity supplied by the reverse proxy

use super::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

/// Identity used when the proxy sends none
pub const DEFAULT_USER_ID: &str = "default_user";

/// Caller identity, available to handlers as an extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resolve the caller identity header and attach it to the request
pub async fn identify(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let server = &state.settings.server;
    let user_id = request
        .headers()
        .get(server.user_id_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_USER_ID)
        .to_string();

    if server.log_user_id && request.uri().path().starts_with("/api/") {
        info!(path = %request.uri().path(), user_id = %user_id, "api request");
    }

    request.extensions_mut().insert(UserId(user_id));
    next.run(request).await
}
