//! HTTP router and handlers

use std::sync::Arc;

use axum::{Router, extract::State, response::Html, routing::get};
use tower_http::{catch_panic::CatchPanicLayer, compression::CompressionLayer, trace::TraceLayer};

use crate::cache::ThrottlingCache;

/// Shared application state
pub struct AppState {
    /// Throttled diagnostics page
    pub cache: Arc<ThrottlingCache>,
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(stats_handler))
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / handler - always 200; modem failures are part of the page
async fn stats_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let page = state.cache.get().await;
    Html(page.to_string())
}
