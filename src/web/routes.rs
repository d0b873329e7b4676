//! Route definitions

use super::handlers;
use super::identity::identify;
use super::state::AppState;
use axum::{middleware, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // API routes
        .route("/api/stats", get(handlers::stats))
        .route("/api/anime-search", get(handlers::cover_search))
        .route("/api/serve-webp/*path", get(handlers::serve_webp));

    // Static uploads
    let upload_dir = &state.settings.storage.upload_dir;
    if upload_dir.is_dir() {
        router = router.nest_service("/api/uploads", ServeDir::new(upload_dir));
    } else {
        warn!("Upload directory {} not found, not serving uploads", upload_dir.display());
    }

    router
        .layer(middleware::from_fn_with_state(state.clone(), identify))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
