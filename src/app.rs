use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware;
use crate::router;
use crate::state::AppState;
use crate::uploads;

/// Assembles the HTTP service: uploaded files are served statically, everything
/// else goes through the route table dispatcher. CORS wraps both.
pub fn build_router(state: AppState) -> Router {
    let cfg_arc = state.config.clone();
    // Room for the image plus multipart framing
    let body_limit = usize::try_from(cfg_arc.uploads.max_bytes.saturating_mul(2)).unwrap_or(usize::MAX);

    Router::new()
        .nest_service(uploads::PUBLIC_PREFIX, ServeDir::new(&cfg_arc.uploads.dir))
        .fallback(router::dispatch)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(cfg_arc, middleware::cors::cors_middleware))
}
